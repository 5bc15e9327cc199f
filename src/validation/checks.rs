//! Primitive value checks used by [`super::Check`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use url::Url;

/// The string form a check sees. Absent and `null` are empty strings;
/// arrays and objects are checked as their JSON text.
pub(super) fn string_form(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

pub(super) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Plain decimal notation only: optional sign, digits, optional fraction,
/// optional exponent. Rejects `inf`, `NaN`, and surrounding whitespace.
fn parse_decimal(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    text.parse().ok()
}

pub(super) fn float_in_range(text: &str, min: Option<f64>, max: Option<f64>) -> bool {
    parse_decimal(text)
        .is_some_and(|f| min.is_none_or(|m| f >= m) && max.is_none_or(|m| f <= m))
}

pub(super) fn int_in_range(text: &str, min: Option<i64>, max: Option<i64>) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    text.parse::<i64>()
        .is_ok_and(|n| min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m))
}

pub(super) fn is_url(text: &str) -> bool {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    let parsed = if text.contains("://") {
        Url::parse(text)
    } else {
        Url::parse(&format!("http://{}", text))
    };
    let Ok(url) = parsed else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https" | "ftp") {
        return false;
    }
    if !url.username().is_empty() || url.password().is_some() {
        return false;
    }
    match url.host() {
        Some(url::Host::Domain(domain)) => {
            let tld = domain.rsplit('.').next().unwrap_or("");
            domain.contains('.')
                && tld.len() >= 2
                && tld.chars().all(|c| c.is_alphabetic())
                && domain.split('.').all(|label| !label.is_empty())
        }
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => true,
        None => false,
    }
}

pub(super) fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || local.contains('@') {
        return false;
    }
    if text.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
        && labels.last().is_some_and(|tld| tld.len() >= 2)
}

pub(super) fn is_iso8601(text: &str) -> bool {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M").is_ok()
}

/// At least one lowercase letter, uppercase letter, digit and one of
/// `@$!%*?&`, starting with a character from those classes. The required
/// classes only count on the first line.
pub(crate) fn is_strong_password(text: &str) -> bool {
    const SPECIAL: &str = "@$!%*?&";
    let allowed = |c: char| c.is_ascii_alphanumeric() || SPECIAL.contains(c);
    let first_line = text
        .split(['\n', '\r', '\u{2028}', '\u{2029}'])
        .next()
        .unwrap_or("");
    first_line.chars().next().is_some_and(allowed)
        && first_line.chars().any(|c| c.is_ascii_lowercase())
        && first_line.chars().any(|c| c.is_ascii_uppercase())
        && first_line.chars().any(|c| c.is_ascii_digit())
        && first_line.chars().any(|c| SPECIAL.contains(c))
}

const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com"];

const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.at", "hotmail.be", "hotmail.ca", "hotmail.cl", "hotmail.co.il", "hotmail.co.nz",
    "hotmail.co.th", "hotmail.co.uk", "hotmail.com", "hotmail.com.ar", "hotmail.com.au",
    "hotmail.com.br", "hotmail.com.gr", "hotmail.com.mx", "hotmail.com.pe", "hotmail.com.tr",
    "hotmail.com.vn", "hotmail.cz", "hotmail.de", "hotmail.dk", "hotmail.es", "hotmail.fr",
    "hotmail.hu", "hotmail.id", "hotmail.ie", "hotmail.in", "hotmail.it", "hotmail.jp",
    "hotmail.kr", "hotmail.lv", "hotmail.my", "hotmail.ph", "hotmail.pt", "hotmail.sa",
    "hotmail.sg", "hotmail.sk", "live.be", "live.co.uk", "live.com", "live.com.ar",
    "live.com.mx", "live.de", "live.es", "live.eu", "live.fr", "live.it", "live.nl", "msn.com",
    "outlook.at", "outlook.be", "outlook.cl", "outlook.co.il", "outlook.co.nz", "outlook.co.th",
    "outlook.com", "outlook.com.ar", "outlook.com.au", "outlook.com.br", "outlook.com.gr",
    "outlook.com.pe", "outlook.com.tr", "outlook.com.vn", "outlook.cz", "outlook.de",
    "outlook.dk", "outlook.es", "outlook.fr", "outlook.hu", "outlook.id", "outlook.ie",
    "outlook.in", "outlook.it", "outlook.jp", "outlook.kr", "outlook.lv", "outlook.my",
    "outlook.ph", "outlook.pt", "outlook.sa", "outlook.sg", "outlook.sk", "passport.com",
];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de", "yahoo.fr",
    "yahoo.in", "yahoo.it", "ymail.com",
];

const YANDEX_DOMAINS: &[&str] = &[
    "yandex.ru", "yandex.ua", "yandex.kz", "yandex.com", "yandex.by", "ya.ru",
];

/// Drop lone dots; runs of two or more are kept as they are.
fn remove_single_dots(local: &str) -> String {
    let mut out = String::with_capacity(local.len());
    let mut chars = local.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '.' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.next_if_eq(&'.').is_some() {
            run += 1;
        }
        if run > 1 {
            out.extend(std::iter::repeat_n('.', run));
        }
    }
    out
}

/// Canonical mailbox for an address, so aliases of one inbox compare equal.
///
/// Everything is lowercased. Gmail drops `+tags` and lone dots and folds
/// `googlemail.com` into `gmail.com`; iCloud and Outlook drop `+tags`; Yahoo
/// drops the last `-suffix`; Yandex domains fold into `yandex.ru`. Returns
/// `None` when there is no `@` or the mailbox part ends up empty.
pub(super) fn normalize_email(text: &str) -> Option<String> {
    let (local, domain) = text.rsplit_once('@')?;
    let local = local.to_lowercase();
    let domain = domain.to_lowercase();
    let is_one_of = |domains: &[&str]| domains.iter().any(|d| *d == domain);

    let (local, domain) = if domain == "gmail.com" || domain == "googlemail.com" {
        (remove_single_dots(before_plus(&local)), "gmail.com".to_string())
    } else if is_one_of(ICLOUD_DOMAINS) || is_one_of(OUTLOOK_DOMAINS) {
        (before_plus(&local).to_string(), domain)
    } else if is_one_of(YAHOO_DOMAINS) {
        let mailbox = local
            .rsplit_once('-')
            .map(|(head, _)| head.to_string())
            .unwrap_or_else(|| local.clone());
        (mailbox, domain)
    } else if is_one_of(YANDEX_DOMAINS) {
        (local, "yandex.ru".to_string())
    } else {
        (local, domain)
    };

    (!local.is_empty()).then(|| format!("{}@{}", local, domain))
}

fn before_plus(local: &str) -> &str {
    local.split('+').next().unwrap_or("")
}
