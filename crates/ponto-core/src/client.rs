//! HTTP client for the remote recognition/roster service.
//!
//! Each call makes exactly one attempt. Transport problems and business
//! rejections both come back as [`Verdict::Failure`]; nothing is thrown
//! past this boundary except roster load failures, which the caller
//! reports while keeping its cached data.

use std::future::Future;
use std::time::Duration;

use ponto_hw::CapturedImage;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Deserializer};

use crate::error::{LoadError, PontoError};
use crate::messages;
use crate::types::{Employee, EnrollmentField, EnrollmentForm, Stats};

/// Header the tunnel in front of the service needs to skip its interstitial page.
pub const BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

pub const CHECKIN_PATH: &str = "/registrar-ponto";
pub const ENROLL_PATH: &str = "/cadastrar";
pub const EMPLOYEES_PATH: &str = "/funcionarios";
pub const STATS_PATH: &str = "/stats";
pub const REMOVE_PATH: &str = "/remover-funcionario";

const IMAGE_FIELD: &str = "imagem";
const CHECKIN_FILE_NAME: &str = "ponto.jpg";
const ENROLL_FILE_NAME: &str = "cadastro.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered `sucesso: false`.
    Rejected,
    /// Network error or a body that was not a verdict.
    Transport,
}

/// Outcome of one check-in, enrollment or removal call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success {
        message: String,
        generated_id: Option<String>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl Verdict {
    pub fn success(message: impl Into<String>) -> Self {
        Verdict::Success {
            message: message.into(),
            generated_id: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Verdict::Failure {
            kind: FailureKind::Rejected,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Verdict::Failure {
            kind: FailureKind::Transport,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Verdict::Success { message, .. } | Verdict::Failure { message, .. } => message,
        }
    }

    /// The error taxonomy entry for a failed verdict.
    pub fn error(&self) -> Option<PontoError> {
        match self {
            Verdict::Success { .. } => None,
            Verdict::Failure {
                kind: FailureKind::Rejected,
                message,
            } => Some(PontoError::Rejected(message.clone())),
            Verdict::Failure {
                kind: FailureKind::Transport,
                message,
            } => Some(PontoError::Transport(message.clone())),
        }
    }
}

/// Raw verdict body shared by every mutating endpoint.
#[derive(Debug, Deserialize)]
struct VerdictBody {
    #[serde(default)]
    sucesso: bool,
    #[serde(default)]
    mensagem: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    id_gerado: Option<String>,
    #[serde(default)]
    erro: Option<String>,
}

/// `id_gerado` arrives as a number from some deployments and as a string from others.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Operations the wizards and the roster need from the remote service.
pub trait AttendanceService {
    fn submit_check_in(&self, image: &CapturedImage) -> impl Future<Output = Verdict> + Send;

    fn submit_enrollment(
        &self,
        form: &EnrollmentForm,
        image: &CapturedImage,
    ) -> impl Future<Output = Verdict> + Send;

    fn list_employees(&self) -> impl Future<Output = Result<Vec<Employee>, LoadError>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<Stats, LoadError>> + Send;

    fn remove_employee(&self, id: i64) -> impl Future<Output = Verdict> + Send;
}

/// Base addresses of the two deployments the kiosk talks to.
///
/// Check-in recognition and the enrollment/roster API are configured
/// separately and may point at different hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub checkin_base: String,
    pub roster_base: String,
}

impl Endpoints {
    pub fn new(checkin_base: impl Into<String>, roster_base: impl Into<String>) -> Self {
        Self {
            checkin_base: trim_base(checkin_base.into()),
            roster_base: trim_base(roster_base.into()),
        }
    }

    /// Both flows on one deployment.
    pub fn single(base: impl Into<String>) -> Self {
        let base = base.into();
        Self::new(base.clone(), base)
    }

    pub fn checkin_url(&self) -> String {
        format!("{}{CHECKIN_PATH}", self.checkin_base)
    }

    pub fn enroll_url(&self) -> String {
        format!("{}{ENROLL_PATH}", self.roster_base)
    }

    pub fn employees_url(&self) -> String {
        format!("{}{EMPLOYEES_PATH}", self.roster_base)
    }

    pub fn stats_url(&self) -> String {
        format!("{}{STATS_PATH}", self.roster_base)
    }

    pub fn remove_url(&self, id: i64) -> String {
        format!("{}{REMOVE_PATH}/{id}", self.roster_base)
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

/// reqwest-backed implementation of [`AttendanceService`].
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl ServiceClient {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoints })
    }

    async fn send_for_verdict(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<VerdictBody, reqwest::Error> {
        let response = request.header(BYPASS_HEADER, "true").send().await?;
        let status = response.status();
        // Rejections come with 4xx/5xx codes and a verdict body, so the
        // body is read whatever the status.
        let body = response.json::<VerdictBody>().await?;
        tracing::debug!(%status, sucesso = body.sucesso, "verdict received");
        Ok(body)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, LoadError> {
        let response = self
            .http
            .get(&url)
            .header(BYPASS_HEADER, "true")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "roster request failed");
            return Err(LoadError::Status(status));
        }
        Ok(response.json::<T>().await?)
    }
}

fn image_part(image: &CapturedImage, file_name: &'static str) -> Result<Part, reqwest::Error> {
    Part::bytes(image.bytes().to_vec())
        .file_name(file_name)
        .mime_str(image.mime())
}

impl AttendanceService for ServiceClient {
    async fn submit_check_in(&self, image: &CapturedImage) -> Verdict {
        let url = self.endpoints.checkin_url();
        tracing::info!(
            %url,
            bytes = image.len(),
            at = %chrono::Local::now().to_rfc3339(),
            "submitting check-in"
        );

        let part = match image_part(image, CHECKIN_FILE_NAME) {
            Ok(part) => part,
            Err(e) => {
                tracing::error!(error = %e, "could not build check-in payload");
                return Verdict::transport(messages::CHECKIN_TRANSPORT);
            }
        };
        let form = Form::new().part(IMAGE_FIELD, part);

        match self.send_for_verdict(self.http.post(&url).multipart(form)).await {
            Ok(body) if body.sucesso => Verdict::Success {
                message: body.mensagem.unwrap_or_default(),
                generated_id: None,
            },
            Ok(body) => Verdict::rejected(
                body.mensagem
                    .or(body.erro)
                    .unwrap_or_else(|| messages::UNKNOWN_REJECTION.to_string()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "check-in transport failure");
                Verdict::transport(messages::CHECKIN_TRANSPORT)
            }
        }
    }

    async fn submit_enrollment(&self, form: &EnrollmentForm, image: &CapturedImage) -> Verdict {
        let url = self.endpoints.enroll_url();
        tracing::info!(%url, nome = %form.nome, bytes = image.len(), "submitting enrollment");

        let part = match image_part(image, ENROLL_FILE_NAME) {
            Ok(part) => part,
            Err(e) => {
                tracing::error!(error = %e, "could not build enrollment payload");
                return Verdict::transport(messages::ENROLLMENT_TRANSPORT);
            }
        };
        let departamento = form
            .departamento
            .map(|d| d.as_str().to_string())
            .unwrap_or_default();
        let multipart = Form::new()
            .text(EnrollmentField::Nome.wire_name(), form.nome.clone())
            .text(EnrollmentField::Departamento.wire_name(), departamento)
            .text(EnrollmentField::Cargo.wire_name(), form.cargo.clone())
            .part(IMAGE_FIELD, part);

        match self
            .send_for_verdict(self.http.post(&url).multipart(multipart))
            .await
        {
            Ok(body) if body.sucesso => Verdict::Success {
                message: body.mensagem.unwrap_or_default(),
                generated_id: body.id_gerado,
            },
            Ok(body) => Verdict::rejected(
                body.erro
                    .or(body.mensagem)
                    .unwrap_or_else(|| messages::UNKNOWN_REJECTION.to_string()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "enrollment transport failure");
                Verdict::transport(messages::ENROLLMENT_TRANSPORT)
            }
        }
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, LoadError> {
        let employees: Vec<Employee> = self.get_json(self.endpoints.employees_url()).await?;
        tracing::debug!(count = employees.len(), "employees loaded");
        Ok(employees)
    }

    async fn fetch_stats(&self) -> Result<Stats, LoadError> {
        self.get_json(self.endpoints.stats_url()).await
    }

    async fn remove_employee(&self, id: i64) -> Verdict {
        let url = self.endpoints.remove_url(id);
        tracing::info!(%url, id, "removing employee");

        match self.send_for_verdict(self.http.delete(&url)).await {
            Ok(body) if body.sucesso => Verdict::success(body.mensagem.unwrap_or_default()),
            Ok(body) => Verdict::rejected(
                body.mensagem
                    .or(body.erro)
                    .unwrap_or_else(|| messages::UNKNOWN_REJECTION.to_string()),
            ),
            Err(e) => {
                tracing::warn!(error = %e, id, "remove transport failure");
                Verdict::transport(messages::REMOVE_TRANSPORT)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_trim_trailing_slash() {
        let ep = Endpoints::new("http://kiosk.local/", "http://rh.local//");
        assert_eq!(ep.checkin_url(), "http://kiosk.local/registrar-ponto");
        assert_eq!(ep.enroll_url(), "http://rh.local/cadastrar");
        assert_eq!(ep.remove_url(12), "http://rh.local/remover-funcionario/12");
    }

    #[test]
    fn test_endpoints_are_independent() {
        let ep = Endpoints::new("http://a", "http://b");
        assert!(ep.checkin_url().starts_with("http://a"));
        assert!(ep.employees_url().starts_with("http://b"));
        assert!(ep.stats_url().starts_with("http://b"));
    }

    #[test]
    fn test_verdict_body_numeric_id() {
        let body: VerdictBody =
            serde_json::from_str(r#"{"sucesso": true, "mensagem": "ok", "id_gerado": 31}"#).unwrap();
        assert_eq!(body.id_gerado.as_deref(), Some("31"));
    }

    #[test]
    fn test_verdict_body_error_only() {
        let body: VerdictBody = serde_json::from_str(r#"{"erro": "Dados incompletos"}"#).unwrap();
        assert!(!body.sucesso);
        assert_eq!(body.erro.as_deref(), Some("Dados incompletos"));
        assert!(body.id_gerado.is_none());
    }

    #[test]
    fn test_verdict_error_mapping() {
        assert!(Verdict::success("ok").error().is_none());
        assert!(matches!(
            Verdict::rejected("no").error(),
            Some(PontoError::Rejected(m)) if m == "no"
        ));
        assert!(matches!(
            Verdict::transport("down").error(),
            Some(PontoError::Transport(_))
        ));
    }
}
