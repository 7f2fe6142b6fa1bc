//! Écriture DXF ASCII (AC1024 / R2010)
//!
//! Le fichier produit contient les sections HEADER, CLASSES, TABLES, BLOCKS,
//! ENTITIES et OBJECTS. Les handles des objets de structure sont fixes, ceux
//! des entités sont attribués séquentiellement à partir de [`FIRST_ENTITY_HANDLE`].
//! La sortie est déterministe : aucune date ni identifiant aléatoire.

use std::io::{self, Write};

use super::{Drawing, Entity, Point3, Text};
use geo::LineString;

/// Version DXF (AutoCAD 2010)
pub const ACAD_VERSION: &str = "AC1024";

/// `$INSUNITS` = mètres
const INSUNITS_METERS: i32 = 6;

// Handles des tables
const H_VPORT_TABLE: u64 = 0x1;
const H_LTYPE_TABLE: u64 = 0x2;
const H_LAYER_TABLE: u64 = 0x3;
const H_STYLE_TABLE: u64 = 0x4;
const H_VIEW_TABLE: u64 = 0x5;
const H_UCS_TABLE: u64 = 0x6;
const H_APPID_TABLE: u64 = 0x7;
const H_DIMSTYLE_TABLE: u64 = 0x8;
const H_BLOCK_RECORD_TABLE: u64 = 0x9;

// Handles des entrées de tables
const H_VPORT_ACTIVE: u64 = 0xA;
const H_LTYPE_BYBLOCK: u64 = 0xB;
const H_LTYPE_BYLAYER: u64 = 0xC;
const H_LTYPE_CONTINUOUS: u64 = 0xD;
const H_LAYER_ZERO: u64 = 0xE;
const H_STYLE_STANDARD: u64 = 0xF;
const H_APPID_ACAD: u64 = 0x10;
const H_DIMSTYLE_STANDARD: u64 = 0x11;
const H_MODEL_SPACE_RECORD: u64 = 0x12;
const H_PAPER_SPACE_RECORD: u64 = 0x13;

// Blocs
const H_MODEL_SPACE_BLOCK: u64 = 0x14;
const H_MODEL_SPACE_END: u64 = 0x15;
const H_PAPER_SPACE_BLOCK: u64 = 0x16;
const H_PAPER_SPACE_END: u64 = 0x17;

// Objets
const H_ROOT_DICTIONARY: u64 = 0x18;
const H_GROUP_DICTIONARY: u64 = 0x19;

/// Calque supplémentaire quand le style n'utilise pas le calque `0`
const H_LAYER_CUSTOM: u64 = 0x1A;

/// Premier handle attribué aux entités
pub const FIRST_ENTITY_HANDLE: u64 = 0x20;

/// Formate un réel DXF (toujours avec un point décimal, jamais d'exposant)
pub fn format_real(value: f64) -> String {
    let mut s = format!("{}", value);
    if value.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Écrivain de paires code de groupe / valeur
pub struct DxfWriter<W: Write> {
    out: W,
}

impl<W: Write> DxfWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Paire texte ; une valeur DXF tient sur une seule ligne
    pub fn pair(&mut self, code: i32, value: &str) -> io::Result<()> {
        if value.contains(['\r', '\n']) {
            write!(self.out, "{:>3}\n{}\n", code, value.replace(['\r', '\n'], " "))
        } else {
            write!(self.out, "{:>3}\n{}\n", code, value)
        }
    }

    pub fn int(&mut self, code: i32, value: i64) -> io::Result<()> {
        write!(self.out, "{:>3}\n{}\n", code, value)
    }

    pub fn real(&mut self, code: i32, value: f64) -> io::Result<()> {
        write!(self.out, "{:>3}\n{}\n", code, format_real(value))
    }

    /// Handle en hexadécimal majuscule
    pub fn handle(&mut self, code: i32, handle: u64) -> io::Result<()> {
        write!(self.out, "{:>3}\n{:X}\n", code, handle)
    }

    /// Point sur les codes `base`, `base + 10`, `base + 20`
    pub fn point(&mut self, base: i32, x: f64, y: f64, z: f64) -> io::Result<()> {
        self.real(base, x)?;
        self.real(base + 10, y)?;
        self.real(base + 20, z)
    }

    pub fn begin_section(&mut self, name: &str) -> io::Result<()> {
        self.pair(0, "SECTION")?;
        self.pair(2, name)
    }

    pub fn end_section(&mut self) -> io::Result<()> {
        self.pair(0, "ENDSEC")
    }

    fn begin_table(&mut self, name: &str, handle: u64, count: i64) -> io::Result<()> {
        self.pair(0, "TABLE")?;
        self.pair(2, name)?;
        self.handle(5, handle)?;
        self.handle(330, 0)?;
        self.pair(100, "AcDbSymbolTable")?;
        self.int(70, count)
    }

    fn end_table(&mut self) -> io::Result<()> {
        self.pair(0, "ENDTAB")
    }

    /// En-tête commun des entrées de table
    fn table_record(
        &mut self,
        kind: &str,
        handle: u64,
        owner: u64,
        subclass: &str,
    ) -> io::Result<()> {
        self.pair(0, kind)?;
        self.handle(5, handle)?;
        self.handle(330, owner)?;
        self.pair(100, "AcDbSymbolTableRecord")?;
        self.pair(100, subclass)
    }

    /// En-tête commun des entités de l'espace objet
    fn entity(&mut self, kind: &str, handle: u64, layer: &str) -> io::Result<()> {
        self.pair(0, kind)?;
        self.handle(5, handle)?;
        self.handle(330, H_MODEL_SPACE_RECORD)?;
        self.pair(100, "AcDbEntity")?;
        self.pair(8, layer)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.pair(0, "EOF")?;
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Emprise 3D du dessin : ((xmin, ymin, zmin), (xmax, ymax, zmax))
fn extents(drawing: &Drawing) -> ((f64, f64, f64), (f64, f64, f64)) {
    let (zmin, zmax) = drawing.elevation_range().unwrap_or((0.0, 0.0));
    match drawing.extents() {
        Some(rect) => (
            (rect.min().x, rect.min().y, zmin),
            (rect.max().x, rect.max().y, zmax),
        ),
        None => ((0.0, 0.0, 0.0), (0.0, 0.0, 0.0)),
    }
}

/// Sérialise le dessin en DXF ASCII
pub fn write_dxf<W: Write>(drawing: &Drawing, out: W) -> io::Result<()> {
    let mut w = DxfWriter::new(out);
    let handseed = FIRST_ENTITY_HANDLE + drawing.entities.len() as u64;
    let (min, max) = extents(drawing);

    write_header(&mut w, min, max, handseed)?;

    w.begin_section("CLASSES")?;
    w.end_section()?;

    write_tables(&mut w, drawing, min, max)?;
    write_blocks(&mut w)?;

    w.begin_section("ENTITIES")?;
    for (i, entity) in drawing.entities.iter().enumerate() {
        let handle = FIRST_ENTITY_HANDLE + i as u64;
        match entity {
            Entity::Point(p) => write_point(&mut w, handle, &drawing.layer, p)?,
            Entity::Text(t) => write_text(&mut w, handle, &drawing.layer, t)?,
            Entity::Polyline(ls) => write_lwpolyline(&mut w, handle, &drawing.layer, ls)?,
        }
    }
    w.end_section()?;

    write_objects(&mut w)?;

    w.finish()?;
    Ok(())
}

fn write_header<W: Write>(
    w: &mut DxfWriter<W>,
    min: (f64, f64, f64),
    max: (f64, f64, f64),
    handseed: u64,
) -> io::Result<()> {
    w.begin_section("HEADER")?;

    w.pair(9, "$ACADVER")?;
    w.pair(1, ACAD_VERSION)?;
    w.pair(9, "$DWGCODEPAGE")?;
    w.pair(3, "ANSI_1252")?;
    w.pair(9, "$INSBASE")?;
    w.point(10, 0.0, 0.0, 0.0)?;
    w.pair(9, "$EXTMIN")?;
    w.point(10, min.0, min.1, min.2)?;
    w.pair(9, "$EXTMAX")?;
    w.point(10, max.0, max.1, max.2)?;
    w.pair(9, "$INSUNITS")?;
    w.int(70, INSUNITS_METERS as i64)?;
    w.pair(9, "$MEASUREMENT")?;
    w.int(70, 1)?;
    w.pair(9, "$HANDSEED")?;
    w.handle(5, handseed)?;

    w.end_section()
}

fn write_tables<W: Write>(
    w: &mut DxfWriter<W>,
    drawing: &Drawing,
    min: (f64, f64, f64),
    max: (f64, f64, f64),
) -> io::Result<()> {
    w.begin_section("TABLES")?;

    // VPORT : vue initiale centrée sur l'emprise
    w.begin_table("VPORT", H_VPORT_TABLE, 1)?;
    w.table_record("VPORT", H_VPORT_ACTIVE, H_VPORT_TABLE, "AcDbViewportTableRecord")?;
    w.pair(2, "*Active")?;
    w.int(70, 0)?;
    w.real(10, 0.0)?;
    w.real(20, 0.0)?;
    w.real(11, 1.0)?;
    w.real(21, 1.0)?;
    w.real(12, (min.0 + max.0) / 2.0)?;
    w.real(22, (min.1 + max.1) / 2.0)?;
    w.real(40, ((max.1 - min.1) * 1.1).max(1.0))?;
    w.real(41, 1.5)?;
    w.end_table()?;

    // LTYPE
    w.begin_table("LTYPE", H_LTYPE_TABLE, 3)?;
    for (handle, name) in [
        (H_LTYPE_BYBLOCK, "ByBlock"),
        (H_LTYPE_BYLAYER, "ByLayer"),
        (H_LTYPE_CONTINUOUS, "Continuous"),
    ] {
        w.table_record("LTYPE", handle, H_LTYPE_TABLE, "AcDbLinetypeTableRecord")?;
        w.pair(2, name)?;
        w.int(70, 0)?;
        w.pair(3, if name == "Continuous" { "Solid line" } else { "" })?;
        w.int(72, 65)?;
        w.int(73, 0)?;
        w.real(40, 0.0)?;
    }
    w.end_table()?;

    // LAYER
    let custom_layer = drawing.layer != "0";
    w.begin_table("LAYER", H_LAYER_TABLE, if custom_layer { 2 } else { 1 })?;
    write_layer(w, H_LAYER_ZERO, "0")?;
    if custom_layer {
        write_layer(w, H_LAYER_CUSTOM, &drawing.layer)?;
    }
    w.end_table()?;

    // STYLE
    w.begin_table("STYLE", H_STYLE_TABLE, 1)?;
    w.table_record("STYLE", H_STYLE_STANDARD, H_STYLE_TABLE, "AcDbTextStyleTableRecord")?;
    w.pair(2, "Standard")?;
    w.int(70, 0)?;
    w.real(40, 0.0)?;
    w.real(41, 1.0)?;
    w.real(50, 0.0)?;
    w.int(71, 0)?;
    w.real(42, 2.5)?;
    w.pair(3, "txt")?;
    w.pair(4, "")?;
    w.end_table()?;

    w.begin_table("VIEW", H_VIEW_TABLE, 0)?;
    w.end_table()?;

    w.begin_table("UCS", H_UCS_TABLE, 0)?;
    w.end_table()?;

    // APPID
    w.begin_table("APPID", H_APPID_TABLE, 1)?;
    w.table_record("APPID", H_APPID_ACAD, H_APPID_TABLE, "AcDbRegAppTableRecord")?;
    w.pair(2, "ACAD")?;
    w.int(70, 0)?;
    w.end_table()?;

    // DIMSTYLE : handle d'entrée sur le code 105
    w.begin_table("DIMSTYLE", H_DIMSTYLE_TABLE, 1)?;
    w.pair(100, "AcDbDimStyleTable")?;
    w.int(71, 0)?;
    w.pair(0, "DIMSTYLE")?;
    w.handle(105, H_DIMSTYLE_STANDARD)?;
    w.handle(330, H_DIMSTYLE_TABLE)?;
    w.pair(100, "AcDbSymbolTableRecord")?;
    w.pair(100, "AcDbDimStyleTableRecord")?;
    w.pair(2, "Standard")?;
    w.int(70, 0)?;
    w.end_table()?;

    // BLOCK_RECORD
    w.begin_table("BLOCK_RECORD", H_BLOCK_RECORD_TABLE, 2)?;
    for (handle, name) in [
        (H_MODEL_SPACE_RECORD, "*Model_Space"),
        (H_PAPER_SPACE_RECORD, "*Paper_Space"),
    ] {
        w.table_record("BLOCK_RECORD", handle, H_BLOCK_RECORD_TABLE, "AcDbBlockTableRecord")?;
        w.pair(2, name)?;
        w.int(70, 0)?;
        w.int(280, 1)?;
        w.int(281, 0)?;
    }
    w.end_table()?;

    w.end_section()
}

fn write_layer<W: Write>(w: &mut DxfWriter<W>, handle: u64, name: &str) -> io::Result<()> {
    w.table_record("LAYER", handle, H_LAYER_TABLE, "AcDbLayerTableRecord")?;
    w.pair(2, name)?;
    w.int(70, 0)?;
    w.int(62, 7)?;
    w.pair(6, "Continuous")?;
    w.int(370, -3)
}

fn write_blocks<W: Write>(w: &mut DxfWriter<W>) -> io::Result<()> {
    w.begin_section("BLOCKS")?;

    for (begin, end, record, name, paper) in [
        (H_MODEL_SPACE_BLOCK, H_MODEL_SPACE_END, H_MODEL_SPACE_RECORD, "*Model_Space", false),
        (H_PAPER_SPACE_BLOCK, H_PAPER_SPACE_END, H_PAPER_SPACE_RECORD, "*Paper_Space", true),
    ] {
        w.pair(0, "BLOCK")?;
        w.handle(5, begin)?;
        w.handle(330, record)?;
        w.pair(100, "AcDbEntity")?;
        if paper {
            w.int(67, 1)?;
        }
        w.pair(8, "0")?;
        w.pair(100, "AcDbBlockBegin")?;
        w.pair(2, name)?;
        w.int(70, 0)?;
        w.point(10, 0.0, 0.0, 0.0)?;
        w.pair(3, name)?;
        w.pair(1, "")?;

        w.pair(0, "ENDBLK")?;
        w.handle(5, end)?;
        w.handle(330, record)?;
        w.pair(100, "AcDbEntity")?;
        if paper {
            w.int(67, 1)?;
        }
        w.pair(8, "0")?;
        w.pair(100, "AcDbBlockEnd")?;
    }

    w.end_section()
}

fn write_point<W: Write>(
    w: &mut DxfWriter<W>,
    handle: u64,
    layer: &str,
    p: &Point3,
) -> io::Result<()> {
    w.entity("POINT", handle, layer)?;
    w.pair(100, "AcDbPoint")?;
    w.point(10, p.x, p.y, p.z)
}

fn write_text<W: Write>(
    w: &mut DxfWriter<W>,
    handle: u64,
    layer: &str,
    t: &Text,
) -> io::Result<()> {
    w.entity("TEXT", handle, layer)?;
    w.pair(100, "AcDbText")?;
    w.point(10, t.insert.x, t.insert.y, 0.0)?;
    w.real(40, t.height)?;
    w.pair(1, &t.content)?;
    w.pair(7, "Standard")?;
    w.pair(100, "AcDbText")
}

fn write_lwpolyline<W: Write>(
    w: &mut DxfWriter<W>,
    handle: u64,
    layer: &str,
    ls: &LineString<f64>,
) -> io::Result<()> {
    w.entity("LWPOLYLINE", handle, layer)?;
    w.pair(100, "AcDbPolyline")?;
    w.int(90, ls.0.len() as i64)?;
    // Non marquée fermée : la fermeture est portée par le sommet répété
    w.int(70, 0)?;
    w.real(43, 0.0)?;
    for c in &ls.0 {
        w.real(10, c.x)?;
        w.real(20, c.y)?;
    }
    Ok(())
}

fn write_objects<W: Write>(w: &mut DxfWriter<W>) -> io::Result<()> {
    w.begin_section("OBJECTS")?;

    w.pair(0, "DICTIONARY")?;
    w.handle(5, H_ROOT_DICTIONARY)?;
    w.handle(330, 0)?;
    w.pair(100, "AcDbDictionary")?;
    w.int(281, 1)?;
    w.pair(3, "ACAD_GROUP")?;
    w.handle(350, H_GROUP_DICTIONARY)?;

    w.pair(0, "DICTIONARY")?;
    w.handle(5, H_GROUP_DICTIONARY)?;
    w.handle(330, H_ROOT_DICTIONARY)?;
    w.pair(100, "AcDbDictionary")?;
    w.int(281, 1)?;

    w.end_section()
}
