//! Étiquettes alphabétiques des points (A, B, …, Z, AA, AB, …)

/// Étiquette du point d'index `index` (0-based), numération bijective en base 26
///
/// 0 → `A`, 25 → `Z`, 26 → `AA`, 701 → `ZZ`, 702 → `AAA`.
pub fn point_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }

    letters.reverse();
    // Uniquement des lettres ASCII
    String::from_utf8(letters).unwrap_or_default()
}

/// Itérateur infini sur les étiquettes à partir de `A`
pub fn labels() -> impl Iterator<Item = String> {
    (0..).map(point_label)
}
