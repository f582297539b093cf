//! URL-safe cleanup for the friendly side of a rewrite.

/// Clean a resolved replace string for use as a friendly URL: optional ASCII
/// transliteration, HTML entity removal, whitespace and delimiter-run
/// collapsing, ASCII lowercasing.
///
/// Unresolved `%tag%` tokens pass through untouched so a partial resolution
/// stays visible in the output.
pub(crate) fn clean_url(s: &str, delimiter: char, normalize_ascii: bool) -> String {
    let mut out = if normalize_ascii { transliterate(s) } else { s.to_string() };

    // Entities like &amp; or &#169; never belong in a permalink.
    out = regex!(r"&[^;]+;").replace_all(&out, "").into_owned();

    let delim = delimiter.to_string();
    out = regex!(r"\s+").replace_all(&out, regex::NoExpand(delim.as_str())).into_owned();

    let mut collapsed = String::with_capacity(out.len());
    let mut prev_delim = false;
    for c in out.chars() {
        if c == delimiter {
            if !prev_delim {
                collapsed.push(c);
            }
            prev_delim = true;
        } else {
            collapsed.push(c);
            prev_delim = false;
        }
    }

    collapsed.to_ascii_lowercase()
}

/// Replace special characters with their plain-ASCII counterpart and drop
/// whatever has no counterpart. Only used when the transliteration toggle
/// is on.
pub(crate) fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.replace("&amp;", "and").chars() {
        match fold_char(c) {
            Some(rep) => out.push_str(rep),
            None if c.is_ascii() => out.push(c),
            // No ASCII counterpart: drop it.
            None => {}
        }
    }
    out
}

fn fold_char(c: char) -> Option<&'static str> {
    Some(match c {
        '@' => "at",
        '©' => "c",
        '®' => "r",
        '™' => "tm",
        'À' | 'Á' | 'Â' | 'Ä' | 'Å' | 'à' | 'á' | 'â' | 'ä' | 'å' | 'Ā' | 'ā' | 'Ă' | 'ă' | 'Ą' | 'ą' | 'Ǎ'
        | 'ǎ' | 'Ǻ' | 'ǻ' => "a",
        'Æ' | 'æ' | 'Ǽ' | 'ǽ' => "ae",
        'Ç' | 'ç' | 'Ć' | 'ć' | 'Ĉ' | 'ĉ' | 'Ċ' | 'ċ' | 'Č' | 'č' => "c",
        'Ď' | 'ď' | 'Đ' | 'đ' => "d",
        'È' | 'É' | 'Ë' | 'è' | 'é' | 'ê' | 'ë' | 'Ē' | 'ē' | 'Ĕ' | 'ĕ' | 'Ė' | 'ė' | 'Ę' | 'ę' | 'Ě' | 'ě'
        | 'Ə' | 'ə' => "e",
        'ƒ' => "f",
        'Ĝ' | 'ĝ' | 'Ğ' | 'ğ' | 'Ġ' | 'ġ' | 'Ģ' | 'ģ' | 'Ґ' | 'ґ' => "g",
        'Ĥ' | 'ĥ' | 'Ħ' | 'ħ' => "h",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'ì' | 'í' | 'î' | 'ï' | 'Ĩ' | 'ĩ' | 'Ī' | 'ī' | 'Ĭ' | 'ĭ' | 'Į' | 'į' | 'İ'
        | 'ı' | 'Ǐ' | 'ǐ' => "i",
        'Ĳ' | 'ĳ' => "ij",
        'Ĵ' | 'ĵ' => "j",
        'Ķ' | 'ķ' | 'ĸ' => "k",
        'Ĺ' | 'ĺ' | 'Ļ' | 'ļ' | 'Ľ' | 'ľ' | 'Ŀ' | 'ŀ' | 'Ł' | 'ł' => "l",
        'Ń' | 'ń' | 'Ņ' | 'ņ' | 'Ň' | 'ň' | 'ŉ' | 'Ŋ' | 'ŋ' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ō' | 'ō' | 'Ŏ' | 'ŏ' | 'Ő'
        | 'ő' | 'Ơ' | 'ơ' | 'Ǒ' | 'ǒ' | 'Ǿ' | 'ǿ' => "o",
        'Œ' | 'œ' => "oe",
        'þ' => "p",
        'Ŕ' | 'ŕ' | 'Ŗ' | 'ŗ' | 'Ř' | 'ř' => "r",
        'ß' => "ss",
        'Ś' | 'ś' | 'Ŝ' | 'ŝ' | 'Ş' | 'ş' | 'Š' | 'š' => "s",
        'Ţ' | 'ţ' | 'Ť' | 'ť' | 'Ŧ' | 'ŧ' => "t",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'ù' | 'ú' | 'û' | 'ü' | 'Ũ' | 'ũ' | 'Ū' | 'ū' | 'Ŭ' | 'ŭ' | 'Ů' | 'ů' | 'Ű'
        | 'ű' | 'Ų' | 'ų' | 'Ư' | 'ư' | 'Ǔ' | 'ǔ' | 'Ǖ' | 'ǖ' | 'Ǘ' | 'ǘ' | 'Ǚ' | 'ǚ' | 'Ǜ' | 'ǜ' => "u",
        'Ŵ' | 'ŵ' => "w",
        'Ý' | 'ý' | 'ÿ' | 'Ŷ' | 'ŷ' | 'Ÿ' => "y",
        'Ź' | 'ź' | 'Ż' | 'ż' | 'Ž' | 'ž' | 'ſ' => "z",
        // Cyrillic.
        'А' | 'а' => "a",
        'Б' | 'б' => "b",
        'В' | 'в' => "v",
        'Г' | 'г' => "g",
        'Д' | 'д' => "d",
        'Е' | 'е' | 'Є' | 'є' | 'Э' | 'э' => "e",
        'Ё' | 'ё' => "jo",
        'Ж' | 'ж' => "zh",
        'З' | 'з' => "z",
        'И' | 'и' | 'І' | 'і' | 'Ї' | 'ї' => "i",
        'Й' | 'й' => "j",
        'К' | 'к' => "k",
        'Л' | 'л' => "l",
        'М' | 'м' => "m",
        'Н' | 'н' => "n",
        'О' | 'о' => "o",
        'П' | 'п' => "p",
        'Р' | 'р' => "r",
        'С' | 'с' => "s",
        'Т' | 'т' => "t",
        'У' | 'у' => "u",
        'Ф' | 'ф' => "f",
        'Х' | 'х' => "h",
        'Ц' | 'ц' => "c",
        'Ч' | 'ч' => "ch",
        'Ш' | 'ш' => "sh",
        'Щ' | 'щ' => "sch",
        'Ъ' | 'ъ' | 'Ь' | 'ь' => "-",
        'Ы' | 'ы' => "y",
        'Ю' | 'ю' => "ju",
        'Я' | 'я' => "ja",
        _ => return None,
    })
}
