//! RFC 8288 `Link` header handling, limited to what paging needs.

/// Returns the target of the `rel="next"` relation, if present.
///
/// Sections without angle brackets are skipped rather than rejected, since
/// one malformed relation should not hide a valid `next`.
pub fn parse_link_next(header: &str) -> Option<String> {
    header.split(',').find_map(|section| {
        let mut parts = section.split(';').map(str::trim);
        let target = parts.next()?.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_ascii_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });
        (is_next && !target.is_empty()).then(|| target.to_string())
    })
}
