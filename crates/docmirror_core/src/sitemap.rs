use anyhow::{Context, Result, bail};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Extract every `<loc>` entry from a sitemap document, in document order.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .context("failed to parse sitemap XML")?
        {
            Event::Start(e) if e.name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Event::End(e) if e.name().as_ref() == b"loc" => {
                in_loc = false;
                let url = current.trim().to_string();
                if !url.is_empty() {
                    urls.push(url);
                }
            }
            Event::Text(e) if in_loc => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .context("failed to decode sitemap text")?;
                current.push_str(&text);
            }
            Event::GeneralRef(e) if in_loc => {
                let entity = reader
                    .decoder()
                    .decode(&e)
                    .context("failed to decode sitemap entity")?;
                current.push_str(decode_entity(&entity));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}

/// Sitemap URLs restricted to the documentation subtree.
///
/// Zero qualifying URLs means the sitemap contract changed upstream; that
/// is fatal for the whole run, before anything is written.
pub fn documentation_urls(xml: &str, base_url: &str, docs_prefix: &str) -> Result<Vec<String>> {
    let prefix = format!("{base_url}{docs_prefix}");
    let urls: Vec<String> = parse_sitemap(xml)?
        .into_iter()
        .filter(|url| url.starts_with(&prefix))
        .collect();
    if urls.is_empty() {
        bail!("no documentation URLs under {prefix} in the sitemap; the upstream layout may have changed");
    }
    Ok(urls)
}

fn decode_entity(name: &str) -> &'static str {
    match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => "",
    }
}
