//! Reader/writer for the parset XML dialect used by the sidecar files
//!
//! Every metadata sidecar is a tree of `<parset name="...">` elements whose
//! leaves are `<par name="..." type="...">` entries holding whitespace-padded
//! text. String values are double-quoted, array values are one element per
//! line, and documents carry no `<?xml ...?>` declaration (the original
//! writer strips it after the fact; the parser here skips one if present).

use crate::error::{JsError, Result};
use std::fmt::Write as _;
use std::path::Path;

/// One typed leaf entry of a parset
#[derive(Debug, Clone, PartialEq)]
pub struct Par {
    pub name: String,
    pub ptype: String,
    pub value: String,
}

/// A named element holding pars and nested parsets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParSet {
    pub name: String,
    pub pars: Vec<Par>,
    pub children: Vec<ParSet>,
}

impl ParSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pars: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_par(&mut self, name: &str, ptype: &str, value: impl Into<String>) {
        self.pars.push(Par {
            name: name.to_string(),
            ptype: ptype.to_string(),
            value: value.into(),
        });
    }

    pub fn add_string(&mut self, name: &str, value: &str) {
        self.add_par(name, "string", format!("\"{}\"", value));
    }

    pub fn add_strings(&mut self, name: &str, values: &[String]) {
        let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
        self.add_par(name, "string", quoted.join("\n"));
    }

    pub fn add_int(&mut self, name: &str, ptype: &str, value: i64) {
        self.add_par(name, ptype, value.to_string());
    }

    pub fn add_ints(&mut self, name: &str, ptype: &str, values: &[i64]) {
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.add_par(name, ptype, rendered.join("\n"));
    }

    pub fn add_float(&mut self, name: &str, value: f64) {
        self.add_par(name, "double", format_float(value));
    }

    pub fn add_floats(&mut self, name: &str, values: &[f64]) {
        let rendered: Vec<String> = values.iter().map(|v| format_float(*v)).collect();
        self.add_par(name, "double", rendered.join("\n"));
    }

    pub fn add_bool(&mut self, name: &str, value: bool) {
        self.add_par(name, "boolean", value.to_string());
    }

    pub fn add_child(&mut self, child: ParSet) {
        self.children.push(child);
    }

    pub fn child(&self, name: &str) -> Option<&ParSet> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn par(&self, name: &str) -> Option<&Par> {
        self.pars.iter().find(|p| p.name == name)
    }

    fn require(&self, name: &str) -> Result<&Par> {
        self.par(name).ok_or_else(|| {
            JsError::Malformed(format!("parset {} is missing element {}", self.name, name))
        })
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        let par = self.require(name)?;
        par.value.trim().parse().map_err(|_| bad_value(par))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        let par = self.require(name)?;
        par.value.trim().parse().map_err(|_| bad_value(par))
    }

    pub fn bool_par(&self, name: &str) -> Result<bool> {
        let par = self.require(name)?;
        match par.value.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(bad_value(par)),
        }
    }

    pub fn string(&self, name: &str) -> Result<String> {
        Ok(unquote(self.require(name)?.value.trim()))
    }

    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .require(name)?
            .value
            .lines()
            .map(|line| unquote(line.trim()))
            .filter(|line| !line.is_empty())
            .collect())
    }

    pub fn ints(&self, name: &str) -> Result<Vec<i64>> {
        let par = self.require(name)?;
        par.value
            .split_whitespace()
            .map(|tok| tok.parse().map_err(|_| bad_value(par)))
            .collect()
    }

    pub fn floats(&self, name: &str) -> Result<Vec<f64>> {
        let par = self.require(name)?;
        par.value
            .split_whitespace()
            .map(|tok| tok.parse().map_err(|_| bad_value(par)))
            .collect()
    }

    /// Render the document. No XML declaration is emitted.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, 0);
        out
    }

    fn render(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = writeln!(out, "{}<parset name=\"{}\">", pad, escape(&self.name));
        for par in &self.pars {
            if par.value.contains('\n') {
                let _ = writeln!(
                    out,
                    "{}  <par name=\"{}\" type=\"{}\">",
                    pad,
                    escape(&par.name),
                    par.ptype
                );
                for line in par.value.lines() {
                    let _ = writeln!(out, "{}    {}", pad, escape(line));
                }
                let _ = writeln!(out, "{}  </par>", pad);
            } else {
                let _ = writeln!(
                    out,
                    "{}  <par name=\"{}\" type=\"{}\"> {} </par>",
                    pad,
                    escape(&par.name),
                    par.ptype,
                    escape(&par.value)
                );
            }
        }
        for child in &self.children {
            child.render(out, depth + 1);
        }
        let _ = writeln!(out, "{}</parset>", pad);
    }

    /// Parse a sidecar document.
    pub fn parse(text: &str) -> Result<ParSet> {
        let mut cursor = Cursor { text, pos: 0 };
        cursor.skip_ws();
        if cursor.rest().starts_with("<?xml") {
            let end = cursor
                .rest()
                .find("?>")
                .ok_or_else(|| JsError::Malformed("unterminated XML declaration".to_string()))?;
            cursor.pos += end + 2;
            cursor.skip_ws();
        }
        let parset = cursor.parse_parset()?;
        Ok(parset)
    }
}

fn bad_value(par: &Par) -> JsError {
    JsError::Malformed(format!("element {} has unparseable value", par.name))
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

fn format_float(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(JsError::Malformed(format!(
                "expected {} at byte {}",
                token, self.pos
            )))
        }
    }

    /// Consume up to and including `token`, returning the text before it.
    fn take_until(&mut self, token: &str) -> Result<&'a str> {
        match self.rest().find(token) {
            Some(at) => {
                let taken = &self.rest()[..at];
                self.pos += at + token.len();
                Ok(taken)
            }
            None => Err(JsError::Malformed(format!(
                "unterminated element, expected {}",
                token
            ))),
        }
    }

    fn parse_parset(&mut self) -> Result<ParSet> {
        self.expect("<parset")?;
        let attrs = self.take_until(">")?;
        let mut parset = ParSet::new(attr(attrs, "name")?);
        loop {
            self.skip_ws();
            if self.rest().starts_with("</parset>") {
                self.expect("</parset>")?;
                return Ok(parset);
            } else if self.rest().starts_with("<parset") {
                let child = self.parse_parset()?;
                parset.add_child(child);
            } else if self.rest().starts_with("<par") {
                self.expect("<par")?;
                let attrs = self.take_until(">")?;
                let body = self.take_until("</par>")?;
                let value = body
                    .lines()
                    .map(|line| unescape(line.trim()))
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                parset.pars.push(Par {
                    name: attr(attrs, "name")?,
                    ptype: attr(attrs, "type")?,
                    value,
                });
            } else {
                return Err(JsError::Malformed(format!(
                    "unexpected content at byte {}",
                    self.pos
                )));
            }
        }
    }
}

fn attr(attrs: &str, key: &str) -> Result<String> {
    let marker = format!("{}=\"", key);
    let at = attrs
        .find(&marker)
        .ok_or_else(|| JsError::Malformed(format!("element missing attribute {}", key)))?;
    let rest = &attrs[at + marker.len()..];
    let end = rest
        .find('"')
        .ok_or_else(|| JsError::Malformed(format!("unterminated attribute {}", key)))?;
    Ok(unescape(&rest[..end]))
}

/// Parse a sidecar file.
pub fn read_parset_file(path: &Path) -> Result<ParSet> {
    let text = std::fs::read_to_string(path)?;
    ParSet::parse(&text)
}

/// Render a parset to a sidecar file.
pub fn write_parset_file(path: &Path, parset: &ParSet) -> Result<()> {
    std::fs::write(path, parset.to_xml())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParSet {
        let mut root = ParSet::new("JavaSeis Metadata");
        let mut props = ParSet::new("FileProperties");
        props.add_string("TraceFormat", "FLOAT");
        props.add_int("DataDimensions", "int", 3);
        props.add_strings(
            "AxisLabels",
            &["TIME".to_string(), "CROSSLINE".to_string(), "INLINE".to_string()],
        );
        props.add_ints("AxisLengths", "long", &[128, 64, 10]);
        props.add_floats("PhysicalDeltas", &[0.004, 1.0, 1.0]);
        props.add_bool("Mapped", true);
        root.add_child(props);
        root
    }

    #[test]
    fn test_write_parse_roundtrip() {
        let written = sample().to_xml();
        assert!(!written.starts_with("<?xml"));

        let parsed = ParSet::parse(&written).unwrap();
        let props = parsed.child("FileProperties").unwrap();
        assert_eq!(props.string("TraceFormat").unwrap(), "FLOAT");
        assert_eq!(props.int("DataDimensions").unwrap(), 3);
        assert_eq!(
            props.strings("AxisLabels").unwrap(),
            vec!["TIME", "CROSSLINE", "INLINE"]
        );
        assert_eq!(props.ints("AxisLengths").unwrap(), vec![128, 64, 10]);
        assert_eq!(props.floats("PhysicalDeltas").unwrap(), vec![0.004, 1.0, 1.0]);
        assert!(props.bool_par("Mapped").unwrap());
    }

    #[test]
    fn test_parse_skips_declaration() {
        let text = format!("<?xml version=\"1.0\"?>\n{}", sample().to_xml());
        let parsed = ParSet::parse(&text).unwrap();
        assert_eq!(parsed.name, "JavaSeis Metadata");
    }

    #[test]
    fn test_missing_elements_are_malformed() {
        let parsed = ParSet::parse(&sample().to_xml()).unwrap();
        let props = parsed.child("FileProperties").unwrap();
        assert!(matches!(
            props.int("HeaderLengthBytes").unwrap_err(),
            JsError::Malformed(_)
        ));
        assert!(ParSet::parse("<parset name=\"x\"><par name=\"y\">").is_err());
    }

    #[test]
    fn test_escaped_text() {
        let mut root = ParSet::new("root");
        root.add_string("Comments", "a < b & c");
        let parsed = ParSet::parse(&root.to_xml()).unwrap();
        assert_eq!(parsed.string("Comments").unwrap(), "a < b & c");
    }
}
