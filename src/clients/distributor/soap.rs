//! SOAP envelope construction and response parsing for the distributor
//! web ordering service.
//!
//! The service wraps every payload twice: the outer SOAP envelope carries a
//! single `<Operation>Result` element whose *text content* is itself an
//! XML document that must be parsed again to reach the actual payload.
//! All parsing here is tolerant: a malformed or incomplete response is
//! logged and yields an absent result rather than an error, so one bad
//! payload never aborts the batch.

use super::client::ProductData;

/// SOAP 1.1 envelope namespace.
const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace of the distributor's web ordering service.
pub(crate) const SERVICE_NS: &str = "http://services.clfdistribution.com/CLFWebOrdering";

/// In-band error message the service embeds in a 200 response when the
/// authentication token has expired.
pub(crate) const AUTH_REQUIRED_MESSAGE: &str = "Please call GetAuthenticationToken() first";

/// Escapes the five XML special characters in element text.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wraps a header and body fragment in the service's fixed envelope shape.
fn envelope(header_content: &str, body_content: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="{soap_ns}" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema">"#,
            r#"<soap:Header><WebServiceHeader xmlns="{service_ns}">{header}</WebServiceHeader></soap:Header>"#,
            r#"<soap:Body>{body}</soap:Body>"#,
            r#"</soap:Envelope>"#
        ),
        soap_ns = SOAP_NS,
        service_ns = SERVICE_NS,
        header = header_content,
        body = body_content,
    )
}

/// Builds the header fragment carrying the authentication token.
fn token_header(token: &str) -> String {
    format!("<AuthenticationToken>{}</AuthenticationToken>", escape(token))
}

/// Builds the escaped inner `productCodesXml` document for a single code.
fn product_codes_xml(code: &str) -> String {
    escape(&format!(
        "<ProductCodes><Code>{}</Code></ProductCodes>",
        escape(code)
    ))
}

/// Builds the `GetAuthenticationToken` request envelope.
pub(crate) fn authentication_envelope(username: &str, password: &str) -> String {
    envelope(
        "",
        &format!(
            r#"<GetAuthenticationToken xmlns="{SERVICE_NS}"><Username>{}</Username><Password>{}</Password></GetAuthenticationToken>"#,
            escape(username),
            escape(password),
        ),
    )
}

/// Builds the `GetProductCodes` request envelope.
pub(crate) fn product_codes_envelope(token: &str) -> String {
    envelope(
        &token_header(token),
        &format!(r#"<GetProductCodes xmlns="{SERVICE_NS}" />"#),
    )
}

/// Builds the `GetProductStock` request envelope for one product code.
pub(crate) fn product_stock_envelope(token: &str, code: &str) -> String {
    envelope(
        &token_header(token),
        &format!(
            r#"<GetProductStock xmlns="{SERVICE_NS}"><productCodesXml>{}</productCodesXml></GetProductStock>"#,
            product_codes_xml(code),
        ),
    )
}

/// Builds the `GetProductData` request envelope for one product code.
pub(crate) fn product_data_envelope(token: &str, code: &str) -> String {
    envelope(
        &token_header(token),
        &format!(
            r#"<GetProductData xmlns="{SERVICE_NS}"><productCodesXml>{}</productCodesXml></GetProductData>"#,
            product_codes_xml(code),
        ),
    )
}

/// Returns `true` if a transport-successful response carries the in-band
/// re-authentication marker. Never errors; anything unparseable is treated
/// as "no marker".
pub(crate) fn auth_required(body: &str) -> bool {
    let Ok(doc) = roxmltree::Document::parse(body) else {
        return false;
    };
    doc.descendants()
        .find(|node| node.has_tag_name((SERVICE_NS, "ErrorMessage")))
        .and_then(|node| node.text())
        .is_some_and(|text| text == AUTH_REQUIRED_MESSAGE)
}

/// Extracts the text of the named `*Result` element from an outer envelope.
fn result_text<'a>(doc: &'a roxmltree::Document<'a>, result_tag: &str) -> Option<&'a str> {
    doc.descendants()
        .find(|node| node.has_tag_name((SERVICE_NS, result_tag)))
        .and_then(|node| node.text())
}

/// Extracts the authentication token from a `GetAuthenticationToken`
/// response.
///
/// Returns `None` on malformed XML or a missing/empty token field; the
/// caller maps that to an authentication failure.
pub(crate) fn parse_auth_token(body: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(body).ok()?;
    result_text(&doc, "GetAuthenticationTokenResult")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

/// Extracts the product code list from a `GetProductCodes` response.
///
/// The inner document is `<ProductCodes><Code><sku>…</sku></Code>…`.
/// Malformed or missing payloads yield an empty list with a log entry.
pub(crate) fn parse_product_codes(body: &str) -> Vec<String> {
    let doc = match roxmltree::Document::parse(body) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(error = %err, "XML parsing error in GetProductCodes response");
            return Vec::new();
        }
    };

    let Some(inner_xml) = result_text(&doc, "GetProductCodesResult") else {
        tracing::warn!("no product codes found in response");
        return Vec::new();
    };

    let inner = match roxmltree::Document::parse(inner_xml) {
        Ok(inner) => inner,
        Err(err) => {
            tracing::error!(error = %err, "inner product codes document is malformed");
            return Vec::new();
        }
    };

    inner
        .descendants()
        .filter(|node| node.has_tag_name("Code"))
        .filter_map(|code| {
            code.children()
                .find(|child| child.has_tag_name("sku"))
                .and_then(|sku| sku.text())
                .map(String::from)
        })
        .collect()
}

/// Extracts the stock figure for one product from a `GetProductStock`
/// response.
///
/// The figure is looked up inside a `<Product>` element first, then as a
/// bare `<stock>` element. A missing or non-numeric value is a data error:
/// it is logged and yields `None`, never an exception that aborts the run.
pub(crate) fn parse_stock(body: &str, product_code: &str) -> Option<i64> {
    let doc = match roxmltree::Document::parse(body) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(product_code, error = %err, "XML parsing error in GetProductStock response");
            return None;
        }
    };

    let Some(inner_xml) = result_text(&doc, "GetProductStockResult") else {
        tracing::error!(product_code, "no GetProductStockResult element found");
        return None;
    };

    let inner = match roxmltree::Document::parse(inner_xml) {
        Ok(inner) => inner,
        Err(err) => {
            tracing::error!(product_code, error = %err, "inner stock document is malformed");
            return None;
        }
    };

    let stock_node = inner
        .descendants()
        .find(|node| node.has_tag_name("Product"))
        .and_then(|product| product.children().find(|child| child.has_tag_name("stock")))
        .or_else(|| inner.descendants().find(|node| node.has_tag_name("stock")));

    let Some(text) = stock_node.and_then(|node| node.text()) else {
        tracing::error!(product_code, "stock level not found in response");
        return None;
    };

    match text.trim().parse::<i64>() {
        Ok(stock) => Some(stock),
        Err(_) => {
            tracing::error!(product_code, value = text, "invalid stock value");
            None
        }
    }
}

/// Extracts price and barcode for one product from a `GetProductData`
/// response.
///
/// Both fields must be present; a partial record is logged and dropped.
pub(crate) fn parse_product_data(body: &str, product_code: &str) -> Option<ProductData> {
    let doc = match roxmltree::Document::parse(body) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(product_code, error = %err, "XML parsing error in GetProductData response");
            return None;
        }
    };

    let Some(inner_xml) = result_text(&doc, "GetProductDataResult") else {
        tracing::error!(product_code, "no product data found in response");
        return None;
    };

    let inner = match roxmltree::Document::parse(inner_xml) {
        Ok(inner) => inner,
        Err(err) => {
            tracing::error!(product_code, error = %err, "inner product data document is malformed");
            return None;
        }
    };

    for product in inner.descendants().filter(|node| node.has_tag_name("Product")) {
        let field = |name: &str| {
            product
                .children()
                .find(|child| child.has_tag_name(name))
                .and_then(|node| node.text())
                .map(String::from)
        };

        match (field("msrp"), field("barcode")) {
            (Some(msrp), Some(barcode)) => {
                return Some(ProductData { msrp, barcode });
            }
            _ => {
                tracing::error!(product_code, "missing price or barcode in product data");
            }
        }
    }

    tracing::error!(product_code, "no usable product record in response");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_result(result_tag: &str, inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>
                <r:{result_tag} xmlns:r="{SERVICE_NS}">{}</r:{result_tag}>
              </soap:Body>
            </soap:Envelope>"#,
            escape(inner),
        )
    }

    #[test]
    fn test_authentication_envelope_escapes_credentials() {
        let envelope = authentication_envelope("user&co", "p<w>d");
        assert!(envelope.contains("<Username>user&amp;co</Username>"));
        assert!(envelope.contains("<Password>p&lt;w&gt;d</Password>"));
        assert!(envelope.contains("GetAuthenticationToken"));
    }

    #[test]
    fn test_stock_envelope_embeds_escaped_inner_document() {
        let envelope = product_stock_envelope("tok-1", "A1");
        assert!(envelope.contains("<AuthenticationToken>tok-1</AuthenticationToken>"));
        assert!(envelope.contains("&lt;ProductCodes&gt;&lt;Code&gt;A1&lt;/Code&gt;&lt;/ProductCodes&gt;"));
    }

    #[test]
    fn test_auth_required_detects_marker() {
        let body = format!(
            r#"<soap:Envelope xmlns:soap="{SOAP_NS}">
              <soap:Header>
                <h:WebServiceHeader xmlns:h="{SERVICE_NS}">
                  <h:ErrorMessage>{AUTH_REQUIRED_MESSAGE}</h:ErrorMessage>
                </h:WebServiceHeader>
              </soap:Header>
              <soap:Body />
            </soap:Envelope>"#
        );
        assert!(auth_required(&body));
    }

    #[test]
    fn test_auth_required_ignores_other_errors_and_garbage() {
        let body = format!(
            r#"<soap:Envelope xmlns:soap="{SOAP_NS}">
              <soap:Header>
                <h:WebServiceHeader xmlns:h="{SERVICE_NS}">
                  <h:ErrorMessage>Product not found</h:ErrorMessage>
                </h:WebServiceHeader>
              </soap:Header>
            </soap:Envelope>"#
        );
        assert!(!auth_required(&body));
        assert!(!auth_required("not xml at all"));
        assert!(!auth_required(""));
    }

    #[test]
    fn test_parse_auth_token() {
        let body = wrap_result("GetAuthenticationTokenResult", "abc-token-123");
        assert_eq!(parse_auth_token(&body), Some("abc-token-123".to_string()));
    }

    #[test]
    fn test_parse_auth_token_rejects_empty_and_malformed() {
        let empty = wrap_result("GetAuthenticationTokenResult", "   ");
        assert_eq!(parse_auth_token(&empty), None);
        assert_eq!(parse_auth_token("<broken"), None);
    }

    #[test]
    fn test_parse_product_codes_two_pass() {
        let inner = "<ProductCodes><Code><sku>A1</sku></Code><Code><sku>B2</sku></Code></ProductCodes>";
        let body = wrap_result("GetProductCodesResult", inner);
        assert_eq!(parse_product_codes(&body), vec!["A1", "B2"]);
    }

    #[test]
    fn test_parse_product_codes_missing_payload_is_empty() {
        let body = format!(
            r#"<soap:Envelope xmlns:soap="{SOAP_NS}"><soap:Body /></soap:Envelope>"#
        );
        assert!(parse_product_codes(&body).is_empty());
        assert!(parse_product_codes("garbage").is_empty());
    }

    #[test]
    fn test_parse_stock_reads_nested_product_element() {
        let inner = "<Products><Product><stock> 42 </stock></Product></Products>";
        let body = wrap_result("GetProductStockResult", inner);
        assert_eq!(parse_stock(&body, "A1"), Some(42));
    }

    #[test]
    fn test_parse_stock_falls_back_to_bare_element() {
        let inner = "<StockLevels><stock>7</stock></StockLevels>";
        let body = wrap_result("GetProductStockResult", inner);
        assert_eq!(parse_stock(&body, "A1"), Some(7));
    }

    #[test]
    fn test_parse_stock_non_numeric_is_absent_not_fatal() {
        let inner = "<Products><Product><stock>abc</stock></Product></Products>";
        let body = wrap_result("GetProductStockResult", inner);
        assert_eq!(parse_stock(&body, "A1"), None);
    }

    #[test]
    fn test_parse_stock_missing_field_is_absent() {
        let inner = "<Products><Product /></Products>";
        let body = wrap_result("GetProductStockResult", inner);
        assert_eq!(parse_stock(&body, "A1"), None);
    }

    #[test]
    fn test_parse_product_data_requires_both_fields() {
        let full = wrap_result(
            "GetProductDataResult",
            "<Products><Product><msrp>9.99</msrp><barcode>5000000000001</barcode></Product></Products>",
        );
        let data = parse_product_data(&full, "A1").unwrap();
        assert_eq!(data.msrp, "9.99");
        assert_eq!(data.barcode, "5000000000001");

        let partial = wrap_result(
            "GetProductDataResult",
            "<Products><Product><msrp>9.99</msrp></Product></Products>",
        );
        assert!(parse_product_data(&partial, "A1").is_none());
    }
}
