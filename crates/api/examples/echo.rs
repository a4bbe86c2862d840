use http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use micro_api::validate::{Rule, Rules, Validate, ValidationError};
use micro_api::{BoxError, Router, StatusErrorHandler, endpoint};
use serde::{Deserialize, Serialize};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone)]
struct AppContext {
    greeting: &'static str,
}

#[derive(Deserialize)]
struct EchoRequest {
    message: String,
}

impl Validate for EchoRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        Rules::new().field("message", &self.message, &[Rule::Required, Rule::Ascii, Rule::MaxLength(64)]).finish()
    }
}

#[derive(Serialize)]
struct EchoResponse {
    message: String,
}

impl Validate for EchoResponse {}

async fn echo(input: EchoRequest) -> Result<EchoResponse, BoxError> {
    Ok(EchoResponse { message: input.message })
}

async fn greet(context: AppContext, input: EchoRequest, headers: HeaderMap) -> Result<(EchoResponse, StatusCode), BoxError> {
    let agent = headers.get(http::header::USER_AGENT).and_then(|value| value.to_str().ok()).unwrap_or("stranger");
    Ok((EchoResponse { message: format!("{} {}, {agent}", context.greeting, input.message) }, StatusCode::CREATED))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut builder = Router::builder(AppContext { greeting: "hello" });
    builder.error_handler(StatusErrorHandler);
    builder.register("/echo", "GET", endpoint(echo))?.register("/echo", "POST", endpoint(echo))?;
    builder.scope("/v1").register("/greet", "POST", endpoint(greet))?;
    let router = builder.build()?;

    let requests = vec![
        Request::get("/echo?message=hi").body(String::new())?,
        Request::get("/echo?message=hi").header("accept", "application/yaml").body(String::new())?,
        Request::get("/echo").body(String::new())?,
        Request::post("/echo").header("content-type", "application/json").body(r#"{"message":"posted"}"#.to_owned())?,
        Request::post("/echo").header("content-type", "application/cats").body("meow".to_owned())?,
        Request::post("/v1/greet")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("user-agent", "curl")
            .body("message=world".to_owned())?,
    ];

    for request in requests {
        let line = format!("{} {}", request.method(), request.uri());
        let response = router.handle(request).await;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        info!("{line} -> {status} {}", String::from_utf8_lossy(&body));
    }

    Ok(())
}
