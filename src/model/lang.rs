use std::collections::BTreeMap;

/// Normalize a requested language tag against the alias table used by the
/// localized name maps. Unrecognized non-empty tags pass through lowercased
/// as a best-effort key; empty defaults to English.
pub fn normalize_lang(tag: &str) -> String {
    let lowered = tag.trim().to_lowercase();
    match lowered.as_str() {
        "" | "en" | "eng" => "en".to_string(),
        "cn" | "zh" | "zh-cn" | "zh_cn" => "zh-CN".to_string(),
        "pt" | "br" | "pt-br" | "pt_br" => "pt-BR".to_string(),
        "de" | "ger" => "de".to_string(),
        "es" | "spa" => "es".to_string(),
        "fr" | "fre" => "fr".to_string(),
        "ja" | "jp" | "jpn" => "ja".to_string(),
        "ru" | "rus" => "ru".to_string(),
        _ => lowered,
    }
}

/// Pick a localized name: the requested tag's entry if present and non-empty,
/// else the English entry, else nothing.
pub fn pick_name(names: &BTreeMap<&str, &str>, lang: &str) -> Option<String> {
    names
        .get(lang)
        .copied()
        .filter(|name| !name.is_empty())
        .or_else(|| names.get("en").copied().filter(|name| !name.is_empty()))
        .map(|name| name.to_string())
}
