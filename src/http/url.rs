use std::fmt::Write;

pub fn construct_url(
    base_url: &str,
    params: &[(String, String)],
) -> Result<String, std::fmt::Error> {
    let guessed_length = base_url.len() + (params.len() * 20);
    let mut url = String::with_capacity(guessed_length);

    url.push_str(base_url);

    if params.is_empty() {
        return Ok(url);
    }

    url.push('?');
    write_pairs(&mut url, params)?;

    Ok(url)
}

/// Encodes pairs as an `application/x-www-form-urlencoded` body.
pub fn encode_form(pairs: &[(String, String)]) -> Result<String, std::fmt::Error> {
    let mut body = String::new();
    write_pairs(&mut body, pairs)?;
    Ok(body)
}

/// Percent-encodes a single path segment, e.g. a pipe or secret name.
pub fn encode_segment(segment: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::with_capacity(segment.len());
    encode_into(&mut out, segment)?;
    Ok(out)
}

fn write_pairs(buffer: &mut String, pairs: &[(String, String)]) -> Result<(), std::fmt::Error> {
    let mut separator = "";

    for (key, value) in pairs {
        buffer.push_str(separator);

        encode_into(buffer, key)?;
        buffer.push('=');
        encode_into(buffer, value)?;

        separator = "&";
    }

    Ok(())
}

fn encode_into(buffer: &mut String, input: &str) -> Result<(), std::fmt::Error> {
    for b in input.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                buffer.push(*b as char);
            }
            _ => {
                write!(buffer, "%{:02X}", b)?;
            }
        }
    }

    Ok(())
}
