//! Url slugs for post titles, with Thai transliterated to Latin letters.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());
static MULTI_HYPHEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--+").unwrap());

/// Rough Latin spelling for a Thai character. `Some("")` drops the character
/// (silent consonant, tone marks), `None` keeps it as is.
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'ก' => "k",
        'ข' | 'ฃ' | 'ค' | 'ฅ' | 'ฆ' => "kh",
        'ง' => "ng",
        'จ' | 'ฉ' | 'ช' | 'ฌ' => "ch",
        'ซ' | 'ศ' | 'ษ' | 'ส' => "s",
        'ญ' | 'ย' => "y",
        'ฎ' | 'ด' => "d",
        'ฏ' | 'ต' => "t",
        'ฐ' | 'ฑ' | 'ฒ' | 'ถ' | 'ท' | 'ธ' => "th",
        'ณ' | 'น' => "n",
        'บ' => "b",
        'ป' => "p",
        'ผ' | 'พ' | 'ภ' => "ph",
        'ฝ' | 'ฟ' => "f",
        'ม' => "m",
        'ร' => "r",
        'ล' | 'ฬ' => "l",
        'ว' => "w",
        'ห' | 'ฮ' => "h",
        'อ' => "",
        'ะ' | 'ั' | 'า' => "a",
        'ำ' => "am",
        'ิ' | 'ี' => "i",
        'ึ' | 'ื' => "ue",
        'ุ' | 'ู' => "u",
        'เ' => "e",
        'แ' => "ae",
        'โ' => "o",
        'ใ' | 'ไ' => "ai",
        'ๅ' | '็' | '่' | '้' | '๊' | '๋' | '์' => "",
        _ => return None,
    };
    Some(latin)
}

/// Turn a title into a url slug.
///
/// ```
/// assert_eq!(khanit_renderer::slug::slugify("สถิติ 101"), "sthiti-101");
/// assert_eq!(khanit_renderer::slug::slugify("  Hello, World!  "), "hello-world");
/// ```
pub fn slugify(text: &str) -> String {
    let mut latin = String::with_capacity(text.len());
    for c in text.chars() {
        match transliterate(c) {
            Some(s) => latin.push_str(s),
            None => latin.push(c),
        }
    }

    let lowered = latin.to_lowercase();
    let hyphenated = WHITESPACE_RE.replace_all(lowered.trim(), "-");
    let stripped = NON_SLUG_RE.replace_all(&hyphenated, "");
    let collapsed = MULTI_HYPHEN_RE.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}
