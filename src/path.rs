//! Turning chained call names into url path segments.

/// Splits a camelCase call name into lowercase path segments.
///
/// A new segment starts at every uppercase letter which follows a lowercase letter or digit.
/// A run of uppercase letters stays together as one segment, except for its last letter when that letter starts a
/// new lowercase word, so `guildID` gives `["guild", "id"]` and `HTTPServer` gives `["http", "server"]`.
/// A leading uppercase letter never produces an empty segment.
pub fn camel_segments(name: &str) -> Vec<String> {

    let chars: Vec<char> = name.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();

    for (index, &character) in chars.iter().enumerate() {

        if character.is_uppercase() && !current.is_empty() {
            let previous = chars[index - 1];
            let next_is_lower = chars.get(index + 1).map_or(false, |next| next.is_lowercase());

            if previous.is_lowercase() || previous.is_ascii_digit() || (previous.is_uppercase() && next_is_lower) {
                segments.push(std::mem::take(&mut current));
            }
        }

        current.extend(character.to_lowercase());
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

/// Joins path segments onto an api base with exactly one `/` between each part.
pub fn join_path<S: AsRef<str>>(base: &str, segments: &[S]) -> String {
    let mut uri = base.trim_end_matches('/').to_owned();
    uri.push('/');
    uri.push_str(
        &segments
            .iter()
            .map(|segment| segment.as_ref())
            .collect::<Vec<_>>()
            .join("/"),
    );
    uri
}
