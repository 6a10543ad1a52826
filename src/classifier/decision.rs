//! Decision kind inference from free-text phrases and short codes

use crate::types::DecisionKind;

/// Map a free-text decision phrase ("by fall", "sudden victory - 1", ...)
pub fn kind_from_phrase(phrase: &str) -> Option<DecisionKind> {
    let p = phrase.trim().to_lowercase();
    if p.is_empty() {
        return None;
    }

    let has = |needle: &str| p.contains(needle);
    let kind = if has("tech") && has("fall") {
        DecisionKind::TechFall
    } else if has("fall") {
        DecisionKind::Fall
    } else if has("major") {
        DecisionKind::MajorDecision
    } else if [
        "sudden victory",
        "overtime",
        "over time",
        "tiebreaker",
        "tie breaker",
        "riding time",
        "ultimate",
    ]
    .iter()
    .any(|n| has(n))
    {
        DecisionKind::Overtime
    } else if has("double forfeit") {
        DecisionKind::DoubleForfeit
    } else if has("disqualif") {
        DecisionKind::Disqualification
    } else if has("forfeit") || has("default") || has("injury") {
        DecisionKind::Forfeit
    } else if has("decision") {
        DecisionKind::Decision
    } else if has("bye") {
        DecisionKind::Bye
    } else {
        return None;
    };
    Some(kind)
}

/// Map a short printed code ("TF-1.5", "SV-1", "M. For.", ...)
pub fn kind_from_code(code: &str) -> Option<DecisionKind> {
    let c = code.trim().to_uppercase();
    let kind = match c.as_str() {
        "" => return None,
        "OT" | "UTB" => DecisionKind::Overtime,
        "MD" | "MAJ" => DecisionKind::MajorDecision,
        "FALL" | "PIN" | "F" => DecisionKind::Fall,
        "DEC" | "D" => DecisionKind::Decision,
        "FORF" | "FOR" | "FOR." | "FF" | "M. FOR." | "MFF" | "DEF" | "INJ" => {
            DecisionKind::Forfeit
        }
        "DQ" => DecisionKind::Disqualification,
        "DFF" | "DDQ" => DecisionKind::DoubleForfeit,
        "BYE" => DecisionKind::Bye,
        _ if c.starts_with("SV") || c.starts_with("TB-") || c.ends_with("-OT") => {
            DecisionKind::Overtime
        }
        _ if c.starts_with("TF") => DecisionKind::TechFall,
        _ => return None,
    };
    Some(kind)
}

/// Map a parenthetical detail following a code, e.g. the "Fall" of "TB-2 (Fall)"
pub fn kind_from_detail(detail: &str) -> Option<DecisionKind> {
    let d = detail.trim().to_uppercase();
    if d.contains("TECH") || d.starts_with("TF") {
        Some(DecisionKind::TechFall)
    } else if d.contains("FALL") {
        Some(DecisionKind::Fall)
    } else if d.contains("DEC") {
        Some(DecisionKind::Decision)
    } else if d.contains("MD") || d.contains("MAJ") {
        Some(DecisionKind::MajorDecision)
    } else {
        kind_from_phrase(detail)
    }
}

/// Resolve the decision kind from whatever the line offered
///
/// The phrase wins over the detail, the detail over the code. A phrase that is
/// itself a code ("won in SV-1 over ...") is tried as one before giving up.
/// A plain decision printed with an overtime code is an overtime win.
pub fn resolve_kind(
    phrase: Option<&str>,
    detail: Option<&str>,
    code: Option<&str>,
) -> DecisionKind {
    let kind = resolve_stated_kind(phrase, detail, code);
    if kind == DecisionKind::Decision
        && code.and_then(kind_from_code) == Some(DecisionKind::Overtime)
    {
        return DecisionKind::Overtime;
    }
    kind
}

fn resolve_stated_kind(
    phrase: Option<&str>,
    detail: Option<&str>,
    code: Option<&str>,
) -> DecisionKind {
    phrase
        .and_then(kind_from_phrase)
        .or_else(|| detail.and_then(kind_from_detail))
        .or_else(|| code.and_then(kind_from_code))
        .or_else(|| phrase.and_then(kind_from_code))
        .unwrap_or_else(|| {
            let raw = phrase.or(detail).or(code).unwrap_or_default();
            DecisionKind::Unknown(raw.trim().to_lowercase())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases() {
        assert_eq!(kind_from_phrase("fall"), Some(DecisionKind::Fall));
        assert_eq!(kind_from_phrase("Tech Fall"), Some(DecisionKind::TechFall));
        assert_eq!(kind_from_phrase("major decision"), Some(DecisionKind::MajorDecision));
        assert_eq!(kind_from_phrase("sudden victory - 1"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_phrase("double overtime"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_phrase("riding time"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_phrase("ultimate tiebreaker"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_phrase("medical forfeit"), Some(DecisionKind::Forfeit));
        assert_eq!(kind_from_phrase("injury default"), Some(DecisionKind::Forfeit));
        assert_eq!(kind_from_phrase("double forfeit"), Some(DecisionKind::DoubleForfeit));
        assert_eq!(
            kind_from_phrase("disqualification"),
            Some(DecisionKind::Disqualification)
        );
        assert_eq!(kind_from_phrase("decision"), Some(DecisionKind::Decision));
        assert_eq!(kind_from_phrase("cradle"), None);
    }

    #[test]
    fn test_codes() {
        assert_eq!(kind_from_code("SV-1"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_code("TB-3"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_code("2-OT"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_code("UTB"), Some(DecisionKind::Overtime));
        assert_eq!(kind_from_code("TF-1.5"), Some(DecisionKind::TechFall));
        assert_eq!(kind_from_code("MD"), Some(DecisionKind::MajorDecision));
        assert_eq!(kind_from_code("Dec"), Some(DecisionKind::Decision));
        assert_eq!(kind_from_code("M. For."), Some(DecisionKind::Forfeit));
        assert_eq!(kind_from_code("For."), Some(DecisionKind::Forfeit));
        assert_eq!(kind_from_code("DQ"), Some(DecisionKind::Disqualification));
        assert_eq!(kind_from_code("DDQ"), Some(DecisionKind::DoubleForfeit));
        assert_eq!(kind_from_code("XYZ"), None);
    }

    #[test]
    fn test_detail_refines_code() {
        assert_eq!(
            resolve_kind(None, Some("Fall"), Some("TB-2")),
            DecisionKind::Fall
        );
        assert_eq!(
            resolve_kind(None, Some("RT"), Some("TB-3")),
            DecisionKind::Overtime
        );
    }

    #[test]
    fn test_phrase_wins_over_code() {
        assert_eq!(
            resolve_kind(Some("fall"), None, Some("SV-1")),
            DecisionKind::Fall
        );
        assert_eq!(
            resolve_kind(Some("SV-1"), None, None),
            DecisionKind::Overtime
        );
    }

    #[test]
    fn test_overtime_code_upgrades_plain_decision() {
        assert_eq!(
            resolve_kind(Some("decision"), None, Some("SV-1")),
            DecisionKind::Overtime
        );
        assert_eq!(
            resolve_kind(Some("decision"), None, Some("UTB")),
            DecisionKind::Overtime
        );
        assert_eq!(
            resolve_kind(Some("decision"), None, Some("Dec")),
            DecisionKind::Decision
        );
        assert_eq!(
            resolve_kind(Some("major decision"), None, Some("SV-1")),
            DecisionKind::MajorDecision
        );
    }

    #[test]
    fn test_unknown_keeps_raw() {
        assert_eq!(
            resolve_kind(Some("Cradle"), None, Some("XYZ")),
            DecisionKind::Unknown("cradle".to_string())
        );
        assert_eq!(resolve_kind(None, None, None), DecisionKind::Unknown(String::new()));
    }
}
