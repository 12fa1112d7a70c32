//! Time directory selection for case initialization.
//!
//! A time directory is any root entry whose name parses as a finite number
//! (`0`, `0.5`, `-1`, `1e-3`). Initialization keeps only the latest one.

/// Parse a directory name as a simulation time.
pub fn parse_time(name: &str) -> Option<f64> {
    name.parse::<f64>().ok().filter(|time| time.is_finite())
}

/// Name of the numerically latest time directory. Names are compared in
/// sorted order so equal times (`1` and `1.0`) resolve to the same entry
/// regardless of directory listing order.
pub fn latest_time<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut times: Vec<(&str, f64)> = names
        .into_iter()
        .filter_map(|name| parse_time(name).map(|time| (name, time)))
        .collect();
    times.sort_by(|a, b| a.0.cmp(b.0));

    let mut latest: Option<(&str, f64)> = None;
    for (name, time) in times {
        match latest {
            Some((_, best)) if time <= best => {}
            _ => latest = Some((name, time)),
        }
    }
    latest.map(|(name, _)| name)
}
