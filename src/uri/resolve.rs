/// Resolve a relative reference against the directory of `base`.
///
/// The last segment of `base` is treated as a file name and dropped, so `/css/site.css` and
/// `/css/` both resolve against `/css`. A `..` segment removes one directory; every other
/// segment (empty ones included) is appended as-is. Backtracking stops at the root: the
/// leading empty segment of an absolute base is never removed, and a relative base that has
/// run out of directories ignores further `..` segments.
pub fn to_absolute(reference: &str, base: &str) -> String {
    let reference = reference.strip_prefix("./").unwrap_or(reference);

    let mut segments: Vec<&str> = base.split('/').collect();
    segments.pop();

    let floor = usize::from(base.starts_with('/'));
    for segment in reference.split('/') {
        if segment == ".." {
            if segments.len() > floor {
                segments.pop();
            }
        } else {
            segments.push(segment);
        }
    }

    segments.join("/")
}

/// Express an absolute path relative to the directory of `base`.
///
/// The shared prefix is cut at the last `/` both strings agree on. Every directory of `base`
/// left over after that point becomes one `../`, followed by the remaining segments of
/// `absolute`. Empty segments are skipped and the result never ends with a separator.
pub fn to_relative(absolute: &str, base: &str) -> String {
    let directory = match base.rfind('/') {
        Some(index) => &base[..=index],
        None => "",
    };

    let common = directory
        .bytes()
        .zip(absolute.bytes())
        .take_while(|(left, right)| left == right)
        .count();
    let boundary = directory.as_bytes()[..common]
        .iter()
        .rposition(|&byte| byte == b'/')
        .map_or(0, |index| index + 1);

    let backtracks = directory[boundary..]
        .split('/')
        .filter(|segment| !segment.is_empty())
        .count();

    let mut segments = vec![".."; backtracks];
    segments.extend(
        absolute[boundary..]
            .split('/')
            .filter(|segment| !segment.is_empty()),
    );

    segments.join("/")
}
