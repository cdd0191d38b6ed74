//! Shared utilities

use chatdesk_api::Lead;
use chatdesk_core::AgentProfile;

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Human-readable file size
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Name, description and capabilities of an agent
pub fn agent_info(profile: &AgentProfile) -> String {
    let mut out = format!("{} {}\n{}\n", profile.icon, profile.name, profile.description);
    if !profile.capabilities.is_empty() {
        out.push_str("\nCan help with:\n");
        for capability in profile.capabilities {
            out.push_str(&format!("  - {}\n", capability));
        }
    }
    out.trim_end().to_string()
}

/// Stored lead as a small table; empty fields are shown as "-"
pub fn format_lead(lead: &Lead) -> String {
    let field = |value: &str| {
        if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        }
    };
    format!(
        "Last lead\n{}\nName:      {}\nEmail:     {}\nPhone:     {}\nCompany:   {}\nInterest:  {}",
        "-".repeat(40),
        field(&lead.name),
        field(&lead.email),
        field(&lead.phone),
        field(&lead.company),
        field(&lead.interest),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("teléfono", 4), "telé...");
        assert_eq!(truncate_chars("hola", 10), "hola");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.5 MB");
    }

    #[test]
    fn test_agent_info_lists_capabilities() {
        let profile = AgentProfile::lookup("sales").unwrap();
        let info = agent_info(profile);
        assert!(info.starts_with(profile.icon));
        assert!(info.contains(profile.name));
        assert!(info.contains("Can help with:"));
    }

    #[test]
    fn test_format_lead_fills_blanks() {
        let lead = Lead {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            ..Default::default()
        };
        let text = format_lead(&lead);
        assert!(text.contains("Name:      Ana"));
        assert!(text.contains("Company:   -"));
    }
}
