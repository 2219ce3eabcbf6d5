/// Split a raw clipboard paste or scraped page into trimmed, non-empty lines,
/// preserving source order. Blank lines vanish entirely, which is why the
/// scan windows downstream count lines rather than character offsets.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    raw.replace("\r\n", "\n")
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
