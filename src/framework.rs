//! Target framework names.
//!
//! Nuspec dependency groups name their framework either in long form
//! (`.NETStandard2.0`, `.NETFramework,Version=v4.7.2`) or in the short
//! folder form used inside packages (`netstandard2.0`, `net472`). Output
//! always uses the short folder form.

/// Framework family recognised for canonical formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    NetFramework,
    NetStandard,
    NetCoreApp,
    /// Short `net` prefix; framework or core depending on the major version.
    Net,
    /// Older platform families with a fixed short name and compact versions.
    Legacy(&'static str),
    Portable,
}

/// Long or short identifier (lowercased) to short name.
const LEGACY_FAMILIES: &[(&str, &str)] = &[
    ("monoandroid", "monoandroid"),
    ("monotouch", "monotouch"),
    ("monomac", "monomac"),
    ("xamarin.ios", "xamarinios"),
    ("xamarinios", "xamarinios"),
    ("xamarin.mac", "xamarinmac"),
    ("xamarinmac", "xamarinmac"),
    ("xamarin.tvos", "xamarintvos"),
    ("xamarintvos", "xamarintvos"),
    ("xamarin.watchos", "xamarinwatchos"),
    ("xamarinwatchos", "xamarinwatchos"),
    ("silverlight", "sl"),
    ("sl", "sl"),
    ("windowsphone", "wp"),
    ("wp", "wp"),
    ("windowsphoneapp", "wpa"),
    ("wpa", "wpa"),
    ("windows", "win"),
    ("win", "win"),
    (".netcore", "netcore"),
    ("netcore", "netcore"),
    ("uap", "uap"),
    ("tizen", "tizen"),
    (".netmicroframework", "netmf"),
    ("netmf", "netmf"),
];

/// Short names whose versions may shrink to a single digit (`sl4`, `win8`).
const SINGLE_DIGIT_FAMILIES: &[&str] = &["sl", "wp", "win"];

/// Framework sets of the common portable class library profiles.
const PORTABLE_PROFILES: &[(u32, &str)] = &[
    (5, "net40+win8"),
    (6, "net403+win8"),
    (7, "net45+win8"),
    (14, "net40+sl5"),
    (19, "net403+sl5"),
    (24, "net45+sl5"),
    (31, "win81+wp81"),
    (32, "win81+wpa81"),
    (44, "net451+win81"),
    (49, "net45+wp8"),
    (78, "net45+win8+wp8"),
    (84, "wp81+wpa81"),
    (111, "net45+win8+wpa81"),
    (136, "net40+sl5+win8+wp8"),
    (147, "net403+sl5+win8+wp8"),
    (151, "net451+win81+wpa81"),
    (157, "win81+wp81+wpa81"),
    (158, "net45+sl5+win8+wp8"),
    (259, "net45+win8+wp8+wpa81"),
    (328, "net40+sl5+win8+wp8+wpa81"),
    (336, "net403+sl5+win8+wp8+wpa81"),
    (344, "net45+sl5+win8+wp8+wpa81"),
];

fn family_of(identifier: &str) -> Option<Family> {
    let identifier = identifier.trim().to_lowercase();
    match identifier.as_str() {
        ".netframework" | "netframework" => Some(Family::NetFramework),
        ".netstandard" | "netstandard" => Some(Family::NetStandard),
        ".netcoreapp" | "netcoreapp" => Some(Family::NetCoreApp),
        "net" => Some(Family::Net),
        ".netportable" | "netportable" | "portable" => Some(Family::Portable),
        other => LEGACY_FAMILIES
            .iter()
            .find(|(name, _)| *name == other)
            .map(|(_, short)| Family::Legacy(*short)),
    }
}

/// Parse "4.7.2" or the dotless short form "472" into components.
fn parse_components(version: &str) -> Option<Vec<u32>> {
    let version = version.trim().trim_start_matches(['v', 'V']);
    if version.is_empty() {
        return None;
    }
    if version.contains('.') {
        version.split('.').map(|p| p.parse().ok()).collect()
    } else if version.chars().all(|c| c.is_ascii_digit()) {
        version.chars().map(|c| c.to_digit(10)).collect()
    } else {
        None
    }
}

fn dotted(components: &[u32]) -> String {
    let major = components.first().copied().unwrap_or(0);
    let minor = components.get(1).copied().unwrap_or(0);
    format!("{}.{}", major, minor)
}

/// Trailing zeros are dropped down to `min_parts`; digits are joined
/// without dots unless a part exceeds 9: 4.0 -> 40, 4.7.2 -> 472, 10.0 -> 10.0.
fn compact(components: &[u32], min_parts: usize) -> String {
    let mut parts: Vec<u32> = components.to_vec();
    while parts.len() > min_parts && parts.last() == Some(&0) {
        parts.pop();
    }
    if parts.len() < min_parts {
        parts.resize(min_parts, 0);
    }
    let separator = if parts.iter().any(|p| *p > 9) { "." } else { "" };
    parts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// `portable-<members>` from a profile name (`Profile259`) or a `+` list.
fn portable_folder_name(profile: Option<&str>) -> String {
    let Some(profile) = profile.map(str::trim).filter(|p| !p.is_empty()) else {
        return "portable".to_string();
    };

    let lower = profile.to_lowercase();
    if let Some(number) = lower.strip_prefix("profile") {
        return match number
            .parse::<u32>()
            .ok()
            .and_then(|n| PORTABLE_PROFILES.iter().find(|(id, _)| *id == n))
        {
            Some((_, members)) => format!("portable-{}", members),
            None => format!("portable-{}", lower),
        };
    }

    let mut members: Vec<String> = profile
        .split('+')
        .filter(|m| !m.trim().is_empty())
        .map(|m| short_folder_name(m).unwrap_or_else(|| m.trim().to_lowercase()))
        .collect();
    members.sort();
    members.dedup();
    format!("portable-{}", members.join("+"))
}

/// Canonical short folder name for a target framework label.
///
/// Returns `None` for blank labels and for the "any framework" marker.
/// Unrecognised frameworks are passed through lowercased.
pub fn short_folder_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
        return None;
    }

    let fallback = || Some(trimmed.to_lowercase());

    // "net8.0-windows", "net40-client", "portable-net45+win8"
    let (name, platform) = match trimmed.split_once('-') {
        Some((name, platform)) => (name, Some(platform)),
        None => (trimmed, None),
    };

    // ".NETFramework,Version=v4.5,Profile=Client" style
    let (identifier, version, profile) = match name.split_once(',') {
        Some((identifier, rest)) => {
            let value_of = |wanted: &str| {
                rest.split(',').find_map(|kv| {
                    let (key, value) = kv.split_once('=')?;
                    key.trim().eq_ignore_ascii_case(wanted).then_some(value.trim())
                })
            };
            (
                identifier,
                value_of("version").unwrap_or(""),
                value_of("profile").or(platform),
            )
        }
        None => match name.find(|c: char| c.is_ascii_digit()) {
            Some(idx) => (&name[..idx], &name[idx..], platform),
            None => (name, "", platform),
        },
    };

    let Some(family) = family_of(identifier) else {
        return fallback();
    };
    if family == Family::Portable {
        return Some(portable_folder_name(profile));
    }
    let Some(components) = parse_components(version) else {
        return fallback();
    };
    let major = components.first().copied().unwrap_or(0);

    let base = match family {
        Family::NetStandard => format!("netstandard{}", dotted(&components)),
        Family::NetCoreApp | Family::Net if major >= 5 => {
            format!("net{}", dotted(&components))
        }
        Family::NetCoreApp => format!("netcoreapp{}", dotted(&components)),
        Family::NetFramework | Family::Net => format!("net{}", compact(&components, 2)),
        Family::Legacy(short) => {
            let min_parts = if SINGLE_DIGIT_FAMILIES.contains(&short) { 1 } else { 2 };
            format!("{}{}", short, compact(&components, min_parts))
        }
        Family::Portable => return Some(portable_folder_name(profile)),
    };

    let framework_line = matches!(family, Family::NetFramework | Family::Net) && major < 5;
    match profile {
        None => Some(base),
        Some(profile) if major >= 5 && matches!(family, Family::NetCoreApp | Family::Net) => {
            Some(format!("{}-{}", base, profile.trim().to_lowercase()))
        }
        Some(profile) if framework_line && profile.trim().eq_ignore_ascii_case("client") => {
            Some(format!("{}-client", base))
        }
        Some(profile) if framework_line && profile.trim().eq_ignore_ascii_case("full") => {
            Some(base)
        }
        Some(_) => fallback(),
    }
}
