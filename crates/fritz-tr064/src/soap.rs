//! SOAP-over-HTTP adapter for the TR-064 endpoint.
//!
//! On connect the device description (`/tr64desc.xml`) is fetched and its
//! `<service>` entries indexed; each action call then POSTs a SOAP 1.1
//! envelope to the matching control URL and returns the flat `New*`
//! elements of the response. Authentication challenges are not answered.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use regex::Regex;
use tracing::debug;

use fritz_core::DeviceDescriptor;

use crate::caller::{ActionCaller, ActionFuture, ConnectFuture, Connector};
use crate::error::{RpcError, RpcResult};
use crate::value::{FieldMap, FieldValue};

/// Default TR-064 port on FRITZ!Box devices.
pub const DEFAULT_PORT: u16 = 49000;

const DESCRIPTION_PATH: &str = "/tr64desc.xml";

static SERVICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<service>(.*?)</service>").expect("service regex"));
static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(New[A-Za-z0-9_\-]+)\s*(?:/>|>([^<]*)</New[A-Za-z0-9_\-]+>)").expect("field regex")
});
static FAULT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<errorCode>\s*(\d+)\s*</errorCode>").expect("fault regex"));
static FAULT_DESC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<errorDescription>([^<]*)</errorDescription>").expect("fault regex")
});

/// One `<service>` entry from the device description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service_type: String,
    pub service_id: String,
    pub control_url: String,
}

/// Opens [`SoapSession`]s.
#[derive(Debug, Clone)]
pub struct SoapConnector {
    port: u16,
    timeout: Duration,
}

impl SoapConnector {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

impl Default for SoapConnector {
    fn default() -> Self {
        Self::new(DEFAULT_PORT, Duration::from_secs(10))
    }
}

impl Connector for SoapConnector {
    fn connect<'a>(&'a self, device: &'a DeviceDescriptor) -> ConnectFuture<'a> {
        Box::pin(async move {
            let (status, body) = http_request(
                &device.host,
                self.port,
                "GET",
                DESCRIPTION_PATH,
                None,
                self.timeout,
            )
            .await
            .map_err(|e| RpcError::Connect {
                host: device.host.clone(),
                reason: e.to_string(),
            })?;

            if !(200..300).contains(&status) {
                return Err(RpcError::Connect {
                    host: device.host.clone(),
                    reason: format!("device description returned status {status}"),
                });
            }

            let services = parse_services(&body);
            if services.is_empty() {
                return Err(RpcError::Malformed(format!(
                    "no services in {DESCRIPTION_PATH} of {}",
                    device.host
                )));
            }
            debug!(host = %device.host, services = services.len(), "tr-064 session established");

            let session: Arc<dyn ActionCaller> = Arc::new(SoapSession {
                host: device.host.clone(),
                port: self.port,
                timeout: self.timeout,
                services,
            });
            Ok(session)
        })
    }
}

/// A TR-064 session with one device.
///
/// Requests carry no credentials. A device that demands digest
/// authentication answers every action with HTTP 401, which surfaces as
/// [`RpcError::Status`] and fails that device on every scrape.
#[derive(Debug)]
pub struct SoapSession {
    host: String,
    port: u16,
    timeout: Duration,
    services: Vec<ServiceEntry>,
}

impl SoapSession {
    /// Find the description entry for a short service name.
    pub fn service(&self, service: &str) -> Option<&ServiceEntry> {
        let wanted = normalize_service_id(service);
        self.services
            .iter()
            .find(|s| s.service_id.rsplit(':').next() == Some(wanted.as_str()))
    }
}

impl ActionCaller for SoapSession {
    fn call_action<'a>(
        &'a self,
        service: &'a str,
        action: &'a str,
        arguments: &'a [(&'a str, &'a str)],
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            let entry = self
                .service(service)
                .ok_or_else(|| RpcError::UnknownService(service.to_string()))?;

            let envelope = build_envelope(&entry.service_type, action, arguments);
            let soap_action = format!("\"{}#{}\"", entry.service_type, action);
            let (status, body) = http_request(
                &self.host,
                self.port,
                "POST",
                &entry.control_url,
                Some((soap_action, envelope)),
                self.timeout,
            )
            .await?;

            if let Some(fault) = parse_fault(&body) {
                return Err(fault);
            }
            if !(200..300).contains(&status) {
                return Err(RpcError::Status(status));
            }
            Ok(parse_fields(&body))
        })
    }
}

/// `DeviceInfo:1` → `DeviceInfo1`, `WANCommonInterfaceConfig` →
/// `WANCommonInterfaceConfig1`, `WANCommonIFC1` unchanged.
pub fn normalize_service_id(service: &str) -> String {
    let compact: String = service.chars().filter(|c| *c != ':').collect();
    if compact.ends_with(|c: char| c.is_ascii_digit()) {
        compact
    } else {
        format!("{compact}1")
    }
}

/// Index the `<service>` entries of a device description document.
pub fn parse_services(description: &str) -> Vec<ServiceEntry> {
    SERVICE_RE
        .captures_iter(description)
        .filter_map(|block| {
            let block = block.get(1)?.as_str();
            Some(ServiceEntry {
                service_type: element_text(block, "serviceType")?,
                service_id: element_text(block, "serviceId")?,
                control_url: element_text(block, "controlURL")?,
            })
        })
        .collect()
}

/// Collect the `New*` elements of an action response. Empty elements
/// become [`FieldValue::Null`].
pub fn parse_fields(body: &str) -> FieldMap {
    FIELD_RE
        .captures_iter(body)
        .map(|c| {
            let name = c[1].to_string();
            let value = match c.get(2).map(|m| m.as_str()) {
                Some(text) if !text.is_empty() => FieldValue::Text(xml_unescape(text)),
                _ => FieldValue::Null,
            };
            (name, value)
        })
        .collect()
}

/// Extract a SOAP fault from a response body, if it carries one.
pub fn parse_fault(body: &str) -> Option<RpcError> {
    if !body.contains("Fault>") {
        return None;
    }
    let code = FAULT_CODE_RE
        .captures(body)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let description = FAULT_DESC_RE
        .captures(body)
        .map(|c| xml_unescape(&c[1]))
        .unwrap_or_else(|| "unknown fault".to_string());
    Some(RpcError::Fault { code, description })
}

pub fn build_envelope(service_type: &str, action: &str, arguments: &[(&str, &str)]) -> String {
    let mut args = String::new();
    for (name, value) in arguments {
        args.push_str(&format!("<{name}>{}</{name}>", xml_escape(value)));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         s:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">\
         <s:Body><u:{action} xmlns:u=\"{service_type}\">{args}</u:{action}></s:Body>\
         </s:Envelope>"
    )
}

fn element_text(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)? + open.len();
    let end = start + block[start..].find(&close)?;
    Some(block[start..end].trim().to_string())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn xml_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// `host:port`, with IPv6 literals bracketed.
pub fn authority(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Issue one HTTP/1.1 request and return `(status, body)`.
///
/// `soap` carries the `SOAPAction` header value and the envelope for POSTs.
async fn http_request(
    host: &str,
    port: u16,
    method: &str,
    path: &str,
    soap: Option<(String, String)>,
    timeout: Duration,
) -> RpcResult<(u16, String)> {
    let address = authority(host, port);
    let uri = format!("http://{address}{path}");

    let exchange = async {
        let stream = tokio::net::TcpStream::connect(&address)
            .await
            .map_err(|e| RpcError::Http(format!("connect {address}: {e}")))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| RpcError::Http(format!("handshake with {address}: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(&uri)
            .header("host", &address)
            .header("user-agent", "fritz-exporter/0.1");
        let body = match soap {
            Some((soap_action, envelope)) => {
                builder = builder
                    .header("content-type", "text/xml; charset=\"utf-8\"")
                    .header("soapaction", soap_action);
                Bytes::from(envelope)
            }
            None => Bytes::new(),
        };
        let req = builder
            .body(Full::new(body))
            .map_err(|e| RpcError::Http(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| RpcError::Http(format!("request to {uri}: {e}")))?;
        let status = resp.status().as_u16();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| RpcError::Http(format!("reading body from {uri}: {e}")))?
            .to_bytes();

        Ok::<_, RpcError>((status, String::from_utf8_lossy(&bytes).into_owned()))
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => {
            debug!(%uri, "tr-064 request timed out");
            Err(RpcError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:dslforum-org:device-1-0">
<device>
<serviceList>
<service>
<serviceType>urn:dslforum-org:service:DeviceInfo:1</serviceType>
<serviceId>urn:DeviceInfo-com:serviceId:DeviceInfo1</serviceId>
<controlURL>/upnp/control/deviceinfo</controlURL>
<eventSubURL>/upnp/control/deviceinfo</eventSubURL>
<SCPDURL>/deviceinfoSCPD.xml</SCPDURL>
</service>
<service>
<serviceType>urn:dslforum-org:service:WANCommonInterfaceConfig:1</serviceType>
<serviceId>urn:WANCIfConfig-com:serviceId:WANCommonInterfaceConfig1</serviceId>
<controlURL>/upnp/control/wancommonifconfig1</controlURL>
</service>
<service>
<serviceType>urn:schemas-upnp-org:service:WANCommonInterfaceConfig:1</serviceType>
<serviceId>urn:upnp-org:serviceId:WANCommonIFC1</serviceId>
<controlURL>/igdupnp/control/WANCommonIFC1</controlURL>
</service>
</serviceList>
</device>
</root>"#;

    fn session() -> SoapSession {
        SoapSession {
            host: "fritz.box".to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(1),
            services: parse_services(DESCRIPTION),
        }
    }

    #[test]
    fn normalizes_service_names() {
        assert_eq!(normalize_service_id("DeviceInfo:1"), "DeviceInfo1");
        assert_eq!(normalize_service_id("WANCommonIFC1"), "WANCommonIFC1");
        assert_eq!(
            normalize_service_id("WANCommonInterfaceConfig"),
            "WANCommonInterfaceConfig1"
        );
        assert_eq!(normalize_service_id("WANDSLInterfaceConfig1"), "WANDSLInterfaceConfig1");
    }

    #[test]
    fn parses_service_list() {
        let services = parse_services(DESCRIPTION);
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].service_type, "urn:dslforum-org:service:DeviceInfo:1");
        assert_eq!(services[0].control_url, "/upnp/control/deviceinfo");
    }

    #[test]
    fn resolves_short_service_names() {
        let s = session();
        assert_eq!(
            s.service("DeviceInfo:1").unwrap().control_url,
            "/upnp/control/deviceinfo"
        );
        assert_eq!(
            s.service("WANCommonInterfaceConfig").unwrap().control_url,
            "/upnp/control/wancommonifconfig1"
        );
        assert_eq!(
            s.service("WANCommonIFC1").unwrap().control_url,
            "/igdupnp/control/WANCommonIFC1"
        );
        assert!(s.service("WANPPPConnection:1").is_none());
    }

    #[tokio::test]
    async fn unknown_service_fails_without_network() {
        let s = session();
        let err = s.call_action("WANPPPConnection:1", "GetStatusInfo", &[]).await.unwrap_err();
        assert!(matches!(err, RpcError::UnknownService(_)));
    }

    #[test]
    fn parses_response_fields() {
        let body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
<s:Body>
<u:GetInfoResponse xmlns:u="urn:dslforum-org:service:DeviceInfo:1">
<NewModelName>FRITZ!Box 7590</NewModelName>
<NewSerialNumber>A1B2C3</NewSerialNumber>
<NewUpTime>123456</NewUpTime>
<NewDescription>FRITZ!Box &amp; friends</NewDescription>
<NewX_AVM-DE_Version></NewX_AVM-DE_Version>
<NewProvisioningCode/>
</u:GetInfoResponse>
</s:Body>
</s:Envelope>"#;
        let fields = parse_fields(body);
        assert_eq!(fields["NewModelName"], FieldValue::from("FRITZ!Box 7590"));
        assert_eq!(fields["NewUpTime"], FieldValue::from("123456"));
        assert_eq!(fields["NewDescription"], FieldValue::from("FRITZ!Box & friends"));
        assert_eq!(fields["NewX_AVM-DE_Version"], FieldValue::Null);
        assert_eq!(fields["NewProvisioningCode"], FieldValue::Null);
    }

    #[test]
    fn parses_soap_fault() {
        let body = r#"<s:Envelope><s:Body><s:Fault>
<faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring>
<detail><UPnPError xmlns="urn:dslforum-org:control-1-0">
<errorCode>401</errorCode><errorDescription>Invalid Action</errorDescription>
</UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;
        match parse_fault(body) {
            Some(RpcError::Fault { code, description }) => {
                assert_eq!(code, 401);
                assert_eq!(description, "Invalid Action");
            }
            other => panic!("expected fault, got {other:?}"),
        }
        assert!(parse_fault("<NewUpTime>1</NewUpTime>").is_none());
    }

    #[test]
    fn envelope_carries_action_and_arguments() {
        let env = build_envelope(
            "urn:dslforum-org:service:WANCommonInterfaceConfig:1",
            "X_AVM-DE_GetOnlineMonitor",
            &[("NewSyncGroupIndex", "0")],
        );
        assert!(env.contains(
            "<u:X_AVM-DE_GetOnlineMonitor xmlns:u=\"urn:dslforum-org:service:WANCommonInterfaceConfig:1\">"
        ));
        assert!(env.contains("<NewSyncGroupIndex>0</NewSyncGroupIndex>"));
    }

    #[test]
    fn envelope_escapes_argument_values() {
        let env = build_envelope("urn:x", "Set", &[("NewValue", "a<b&c")]);
        assert!(env.contains("<NewValue>a&lt;b&amp;c</NewValue>"));
    }

    #[test]
    fn authority_brackets_ipv6_literals() {
        assert_eq!(authority("fritz.box", 49000), "fritz.box:49000");
        assert_eq!(authority("192.168.178.1", 49000), "192.168.178.1:49000");
        assert_eq!(authority("fe80::1", 49000), "[fe80::1]:49000");
        assert_eq!(authority("[fd00::1]", 49000), "[fd00::1]:49000");
    }

    /// Serves the device description, then answers every action with a
    /// digest challenge.
    async fn spawn_digest_device() -> u16 {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    loop {
                        let n = stream.read(&mut buf).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        request.extend_from_slice(&buf[..n]);
                        let text = String::from_utf8_lossy(&request).to_string();
                        if let Some(end) = text.find("\r\n\r\n") {
                            let length = text[..end]
                                .lines()
                                .find_map(|l| {
                                    l.to_ascii_lowercase()
                                        .strip_prefix("content-length:")
                                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                                })
                                .unwrap_or(0);
                            if request.len() >= end + 4 + length {
                                break;
                            }
                        }
                    }

                    let response = if request.starts_with(b"GET") {
                        format!(
                            "HTTP/1.1 200 OK\r\ncontent-type: text/xml\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            DESCRIPTION.len(),
                            DESCRIPTION
                        )
                    } else {
                        "HTTP/1.1 401 Unauthorized\r\nwww-authenticate: Digest realm=\"HTTPS Access\", nonce=\"abc\"\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string()
                    };
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        port
    }

    #[tokio::test]
    async fn digest_challenge_fails_the_action() {
        let port = spawn_digest_device().await;
        let connector = SoapConnector::new(port, Duration::from_secs(5));
        let device = DeviceDescriptor::new("127.0.0.1", "monitor", "secret");

        let session = connector.connect(&device).await.unwrap();
        let err = session.call_action("DeviceInfo:1", "GetInfo", &[]).await.unwrap_err();
        assert!(matches!(err, RpcError::Status(401)), "got {err:?}");
    }
}
