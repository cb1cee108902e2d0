use std::collections::BTreeMap;

const ENTITIES: [(&str, char); 6] = [
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&#039;", '\''),
    ("&#39;", '\''),
    ("&lt;", '<'),
    ("&gt;", '>'),
];

/// Undo the escaping HTML markup applies to attribute values (`&amp;` and friends).
///
/// Single pass, so `&amp;lt;` becomes `&lt;` and not `<`.
pub fn decode_html_entities(input: &str) -> String {
    let mut decoded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        decoded.push_str(&rest[..pos]);
        rest = &rest[pos..];

        match ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, c)) => {
                decoded.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

pub fn escape_html(input: &str) -> String {
    input
        .chars()
        .fold(String::with_capacity(input.len()), |mut out, c| {
            match c {
                '&' => out.push_str("&amp;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#039;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                c => out.push(c),
            }
            out
        })
}

/// Decode `key=value&key2=value2` into a map. Later duplicates win.
pub fn parse_query_string(query: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        if key.is_empty() {
            continue;
        }
        params.insert(key, decode_component(value));
    }

    params
}

pub fn build_query_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
