//! Full runs of the popup controller over saved webmail pages, talking to a
//! mock analysis server.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use phishscan::analysis::HttpClassifier;
use phishscan::host::PageHost;
use phishscan::popup::{PopupController, PopupSettings, RunOutcome, StatusClass};
use phishscan::ui::PopupView;

const GMAIL_PAGE: &str = r#"<html>
<head><title>Inbox (3) - Gmail</title><script>window.GM = {};</script></head>
<body>
  <div role="navigation">Inbox Starred Sent</div>
  <div class="a3s aiL">
    <p>Dear customer,</p>
    <p>Your account has been locked. Verify your identity at the link below.</p>
  </div>
</body>
</html>"#;

const GMAIL_TEXT: &str =
    "Dear customer,\nYour account has been locked. Verify your identity at the link below.";

fn saved_page(html: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(html.as_bytes()).unwrap();
    file
}

fn controller(
    page: Option<&NamedTempFile>,
    selection: Option<&str>,
    endpoint: Url,
) -> PopupController {
    PopupController::new(
        Box::new(PageHost::new(
            page.map(|file| file.path().display().to_string()),
            selection.map(str::to_string),
            None,
        )),
        Box::new(HttpClassifier::new(endpoint, Some(Duration::from_secs(5)))),
        PopupSettings::default(),
    )
}

fn analyze_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/analyze", server.uri())).unwrap()
}

async fn mount_verdict(server: &MockServer, text: &str, is_phishing: bool, score: f64) {
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(body_json(serde_json::json!({ "text": text })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_phishing": is_phishing,
            "confidence_score": score
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn gmail_page_flagged_as_phishing() {
    let server = MockServer::start().await;
    mount_verdict(&server, GMAIL_TEXT, true, 87.0).await;

    let page = saved_page(GMAIL_PAGE);
    let mut view = PopupView::new();
    let outcome = controller(Some(&page), None, analyze_url(&server))
        .run(&mut view)
        .await;

    assert!(matches!(outcome, RunOutcome::ResultRendered(r) if r.is_phishing));
    assert!(view.status().contains("PHISHING DETECTED"));
    assert!(view.status().contains("87"));
    assert_eq!(view.class(), StatusClass::Danger);
    assert_eq!(view.preview(), format!("{}...", GMAIL_TEXT));
}

#[tokio::test]
async fn outlook_page_looks_safe() {
    let server = MockServer::start().await;
    mount_verdict(&server, "Minutes from Tuesday are attached.", false, 12.0).await;

    let page = saved_page(
        r#"<html><body>
            <div class="a3s aiL"> </div>
            <div aria-label="Message body">Minutes from Tuesday are attached.</div>
        </body></html>"#,
    );
    let mut view = PopupView::new();
    controller(Some(&page), None, analyze_url(&server))
        .run(&mut view)
        .await;

    assert!(view.status().contains("LOOKS SAFE"));
    assert!(view.status().contains("12"));
    assert_eq!(view.class(), StatusClass::Safe);
}

#[tokio::test]
async fn selection_used_when_no_body_container() {
    let server = MockServer::start().await;
    let selection = "Send me the gift card codes before noon";
    mount_verdict(&server, selection, true, 64.5).await;

    let page = saved_page("<html><body><p>Some unrelated webmail chrome</p></body></html>");
    let mut view = PopupView::new();
    controller(Some(&page), Some(selection), analyze_url(&server))
        .run(&mut view)
        .await;

    assert!(view.status().contains("64.5"));
}

#[tokio::test]
async fn short_text_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let page = saved_page("<html><body>Hi</body></html>");
    let mut view = PopupView::new();
    let outcome = controller(Some(&page), None, analyze_url(&server))
        .run(&mut view)
        .await;

    assert!(matches!(outcome, RunOutcome::TextTooShort));
    assert!(view.status().contains("No email text found"));
}

#[tokio::test]
async fn no_target_reports_no_active_tab() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut view = PopupView::new();
    let outcome = controller(None, None, analyze_url(&server))
        .run(&mut view)
        .await;

    assert!(matches!(outcome, RunOutcome::NoActiveTab));
    assert_eq!(view.status(), "Error: No active tab found.");
}

#[tokio::test]
async fn unreachable_server_is_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let page = saved_page(GMAIL_PAGE);
    let mut view = PopupView::new();
    let endpoint = Url::parse(&format!("http://{}/analyze", addr)).unwrap();
    let outcome = controller(Some(&page), None, endpoint).run(&mut view).await;

    assert!(matches!(outcome, RunOutcome::NetworkFailed(_)));
    assert!(view.status().contains("Connection Error"));
    assert!(view.preview().starts_with("Is the analysis server running?"));
}

#[tokio::test]
async fn malformed_verdict_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_phishing": true,
            "confidence_score": "high"
        })))
        .mount(&server)
        .await;

    let page = saved_page(GMAIL_PAGE);
    let mut view = PopupView::new();
    let outcome = controller(Some(&page), None, analyze_url(&server))
        .run(&mut view)
        .await;

    assert!(matches!(outcome, RunOutcome::InvalidResponse(_)));
    assert_eq!(view.status(), "Invalid Response.");
}

#[tokio::test]
async fn restricted_page_is_extraction_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = PopupController::new(
        Box::new(PageHost::new(Some("chrome://newtab".to_string()), None, None)),
        Box::new(HttpClassifier::new(analyze_url(&server), None)),
        PopupSettings::default(),
    );
    let mut view = PopupView::new();
    let outcome = controller.run(&mut view).await;

    assert!(matches!(outcome, RunOutcome::ExtractionFailed(_)));
    assert_eq!(view.status(), "Extraction Error.");
}

#[tokio::test]
async fn slow_server_times_out_as_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "is_phishing": true,
                    "confidence_score": 99
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let page = saved_page(GMAIL_PAGE);
    let controller = PopupController::new(
        Box::new(PageHost::new(Some(page.path().display().to_string()), None, None)),
        Box::new(HttpClassifier::new(
            analyze_url(&server),
            Some(Duration::from_millis(300)),
        )),
        PopupSettings::default(),
    );
    let mut view = PopupView::new();
    let outcome = controller.run(&mut view).await;

    assert!(matches!(outcome, RunOutcome::NetworkFailed(_)));
    assert_eq!(view.status(), "Connection Error.");
    assert_eq!(view.class(), StatusClass::Neutral);
}
