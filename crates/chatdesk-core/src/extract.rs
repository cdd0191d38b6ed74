//! Contact details inferred from a single free-text message
//!
//! When a user writes their name, email and phone in one message the form
//! does not need to be walked field by field.

use chatdesk_api::ContactForm;
use regex::Regex;
use std::sync::LazyLock;

/// Messages this short are never scanned
const MIN_MESSAGE_CHARS: usize = 20;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:me llamo|mi nombre es|nombre es|nombre:?|soy|my name is|my name's|i'm|i am)[^\n.]*?([A-Za-zÀ-ÖØ-öø-ÿ\s]{2,})",
    )
    .unwrap()
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:teléfono|telefono|móvil|movil|celular|número|numero|phone|mobile|tel)[^\n.]*?([0-9+\s()-]{6,})",
    )
    .unwrap()
});

static COMPANY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:empresa|compañía|compania|organización|organizacion|trabajo en|company|work at|work for)(?:\s+(?:es|is))?[^\n.]*?([A-Za-zÀ-ÖØ-öø-ÿ\s]{2,})",
    )
    .unwrap()
});

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Infer a complete contact form from a message.
///
/// Returns `None` unless the message is long enough and carries a name, an
/// email and a phone number. Company is filled when present.
pub fn extract_contact(message: &str) -> Option<ContactForm> {
    if message.chars().count() <= MIN_MESSAGE_CHARS {
        return None;
    }

    let name = capture(&NAME_RE, message)?;
    let email = EMAIL_RE.find(message)?.as_str().to_string();
    let phone = capture(&PHONE_RE, message)?;
    if phone.chars().filter(|c| c.is_ascii_digit()).count() < 6 {
        return None;
    }
    let company = capture(&COMPANY_RE, message).unwrap_or_default();

    Some(ContactForm {
        name,
        email,
        phone,
        company,
        interest: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_message() {
        let form =
            extract_contact("me llamo Juan, mi email es juan@x.com, mi teléfono 612345678").unwrap();
        assert_eq!(form.name, "Juan");
        assert_eq!(form.email, "juan@x.com");
        assert_eq!(form.phone, "612345678");
        assert_eq!(form.company, "");
    }

    #[test]
    fn test_english_message_with_company() {
        let form = extract_contact(
            "Hi, my name is Ana Lopez, email ana@acme.io, phone +34 600 111 222, company is Acme",
        )
        .unwrap();
        assert_eq!(form.name, "Ana Lopez");
        assert_eq!(form.email, "ana@acme.io");
        assert_eq!(form.phone, "+34 600 111 222");
        assert_eq!(form.company, "Acme");
    }

    #[test]
    fn test_missing_phone_is_not_extracted() {
        assert!(extract_contact("me llamo Juan y mi email es juan@x.com").is_none());
    }

    #[test]
    fn test_missing_name_is_not_extracted() {
        assert!(extract_contact("contact juan@x.com or phone 612345678 please").is_none());
    }

    #[test]
    fn test_short_message_is_skipped() {
        assert!(extract_contact("soy Al, a@b.co").is_none());
    }

    #[test]
    fn test_ordinary_question_is_not_extracted() {
        assert!(extract_contact("What are your prices for the enterprise plan?").is_none());
    }
}
