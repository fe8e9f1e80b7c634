//! Partial model of nmap's XML output (`-oX`).
//!
//! Only the elements the scanner adapter reads are modelled; everything
//! else in the document is ignored.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct NmapRun {
    #[serde(rename = "scaninfo", default)]
    pub scan_info: Vec<XmlScanInfo>,
    #[serde(rename = "host", default)]
    pub hosts: Vec<XmlHost>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlScanInfo {
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(rename = "@services", default)]
    pub services: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlHost {
    pub status: XmlStatus,
    #[serde(rename = "address", default)]
    pub addresses: Vec<XmlAddress>,
    #[serde(default)]
    pub hostnames: Option<XmlHostnames>,
    #[serde(default)]
    pub ports: Option<XmlPorts>,
}

impl XmlHost {
    /// First address of the given type (`ipv4`, `ipv6`, `mac`).
    pub fn address(&self, addr_type: &str) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == addr_type)
            .map(|a| a.addr.as_str())
    }

    pub fn is_up(&self) -> bool {
        self.status.state == "up"
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlAddress {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlHostnames {
    #[serde(rename = "hostname", default)]
    pub hostnames: Vec<XmlHostname>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlHostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlPorts {
    #[serde(rename = "port", default)]
    pub ports: Vec<XmlPort>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlPort {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub port_id: u16,
    pub state: XmlPortState,
    #[serde(default)]
    pub service: Option<XmlService>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlPortState {
    #[serde(rename = "@state")]
    pub state: String,
    #[serde(rename = "@reason", default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct XmlService {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@product", default)]
    pub product: String,
    #[serde(rename = "@version", default)]
    pub version: String,
    #[serde(rename = "@extrainfo", default)]
    pub extrainfo: String,
    #[serde(rename = "@conf", default)]
    pub conf: String,
    #[serde(rename = "cpe", default)]
    pub cpe: Vec<String>,
}

/// Parse an nmap XML document.
pub(crate) fn parse(xml: &str) -> Result<NmapRun, quick_xml::DeError> {
    quick_xml::de::from_str(xml)
}
