use std::collections::BTreeSet;

/// Extract the logical service names from a `docker-compose ps` listing.
///
/// Compose names containers `<project>_<service>_<index>`; this strips the
/// project prefix and the numeric instance suffix. Recovering the service
/// name from that convention is a best-effort heuristic rather than a
/// bijection: a service whose own name ends in an underscore-delimited
/// number cannot be told apart from an instance suffix.
pub fn parse_from_ps_output(output: &str) -> BTreeSet<String> {
    let lines: Vec<&str> = output.lines().collect();
    let body_start = lines
        .iter()
        .position(|line| is_separator_line(line))
        .map_or_else(|| lines.len().min(2), |index| index + 1);

    lines[body_start..]
        .iter()
        .filter_map(|line| service_name(line))
        .collect()
}

// The listing header ends either with a dashed separator line or, on older
// compose versions, spans a fixed two-line banner.
fn is_separator_line(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| c == '-' || c.is_whitespace())
}

fn service_name(line: &str) -> Option<String> {
    let identifier = line.split_whitespace().next()?;
    let tokens: Vec<&str> = identifier.split('_').collect();

    let name = match tokens.as_slice() {
        [_, middle @ .., last] if !middle.is_empty() && is_instance_index(last) => middle.join("_"),
        [_, rest @ ..] if !rest.is_empty() => rest.join("_"),
        _ => identifier.to_owned(),
    };
    Some(name)
}

fn is_instance_index(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit())
}
