use std::time::Duration;

use mockito::Matcher;
use ponto_core::client::BYPASS_HEADER;
use ponto_core::{
    AttendanceService, Department, Endpoints, EnrollmentForm, FailureKind, LoadError,
    ServiceClient, Verdict,
};
use ponto_hw::{CapturedImage, FrameCapturer, SyntheticCamera};

fn still() -> CapturedImage {
    FrameCapturer::default()
        .encode(SyntheticCamera::test_pattern(8, 8).frame())
        .unwrap()
}

fn client(base: &str) -> ServiceClient {
    ServiceClient::new(Endpoints::single(base), Duration::from_secs(5)).unwrap()
}

fn form() -> EnrollmentForm {
    EnrollmentForm {
        nome: "Ana Souza".into(),
        departamento: Some(Department::RecursosHumanos),
        cargo: "Analista".into(),
    }
}

#[tokio::test]
async fn check_in_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/registrar-ponto")
        .match_header(BYPASS_HEADER, "true")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="imagem""#.into()),
            Matcher::Regex(r#"filename="ponto.jpg""#.into()),
            Matcher::Regex("image/jpeg".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"sucesso": true, "mensagem": "Ponto de 'ENTRADA' registrado para Ana."}"#)
        .create_async()
        .await;

    let verdict = client(&server.url()).submit_check_in(&still()).await;
    assert_eq!(
        verdict,
        Verdict::success("Ponto de 'ENTRADA' registrado para Ana.")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn check_in_rejection_with_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/registrar-ponto")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"sucesso": false, "mensagem": "rosto não reconhecido"}"#)
        .create_async()
        .await;

    let verdict = client(&server.url()).submit_check_in(&still()).await;
    assert_eq!(verdict, Verdict::rejected("rosto não reconhecido"));
}

#[tokio::test]
async fn check_in_non_json_body_is_transport_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/registrar-ponto")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let verdict = client(&server.url()).submit_check_in(&still()).await;
    assert!(matches!(
        verdict,
        Verdict::Failure {
            kind: FailureKind::Transport,
            ..
        }
    ));
    assert_eq!(verdict.message(), ponto_core::messages::CHECKIN_TRANSPORT);
}

#[tokio::test]
async fn check_in_unreachable_is_transport_failure() {
    let verdict = client("http://127.0.0.1:1").submit_check_in(&still()).await;
    assert!(matches!(
        verdict,
        Verdict::Failure {
            kind: FailureKind::Transport,
            ..
        }
    ));
}

#[tokio::test]
async fn enrollment_sends_fields_and_reads_numeric_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cadastrar")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="nome"\r\n\r\nAna Souza"#.into()),
            Matcher::Regex(r#"name="departamento"\r\n\r\nRecursos Humanos"#.into()),
            Matcher::Regex(r#"name="cargo"\r\n\r\nAnalista"#.into()),
            Matcher::Regex(r#"filename="cadastro.jpg""#.into()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"sucesso": true, "mensagem": "Funcionário Ana Souza cadastrado com sucesso!", "id_gerado": 17}"#,
        )
        .create_async()
        .await;

    let verdict = client(&server.url())
        .submit_enrollment(&form(), &still())
        .await;
    assert_eq!(
        verdict,
        Verdict::Success {
            message: "Funcionário Ana Souza cadastrado com sucesso!".into(),
            generated_id: Some("17".into()),
        }
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn enrollment_failure_prefers_erro() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/cadastrar")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"sucesso": false, "mensagem": "genérico", "erro": "Ocorreu um erro interno"}"#)
        .create_async()
        .await;

    let verdict = client(&server.url())
        .submit_enrollment(&form(), &still())
        .await;
    assert_eq!(verdict, Verdict::rejected("Ocorreu um erro interno"));
}

#[tokio::test]
async fn enrollment_failure_falls_back_to_mensagem() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/cadastrar")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"sucesso": false, "mensagem": "falha ao cadastrar face"}"#)
        .create_async()
        .await;

    let verdict = client(&server.url())
        .submit_enrollment(&form(), &still())
        .await;
    assert_eq!(verdict, Verdict::rejected("falha ao cadastrar face"));
}

#[tokio::test]
async fn list_employees_and_stats() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/funcionarios")
        .match_header(BYPASS_HEADER, "true")
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"id": 1, "nome": "Ana Souza", "departamento": "Recursos Humanos",
                 "cargo": "Analista", "status": "Ativo", "admissao": "02/01/2025"},
                {"id": 2, "nome": "Bruno Reis", "departamento": null,
                 "cargo": null, "status": null, "admissao": null}]"#,
        )
        .create_async()
        .await;
    server
        .mock("GET", "/stats")
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 2, "ativos": 1, "inativos": 1, "departamentos": 1}"#)
        .create_async()
        .await;

    let client = client(&server.url());
    let employees = client.list_employees().await.unwrap();
    assert_eq!(employees.len(), 2);
    assert_eq!(employees[0].status.as_deref(), Some("Ativo"));
    assert_eq!(employees[1].departamento, None);

    let stats = client.fetch_stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.departamentos, 1);
}

#[tokio::test]
async fn list_employees_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/funcionarios")
        .with_status(500)
        .with_body(r#"{"erro": "Erro interno ao buscar funcionários."}"#)
        .create_async()
        .await;

    let err = client(&server.url()).list_employees().await.unwrap_err();
    assert!(matches!(err, LoadError::Status(s) if s.as_u16() == 500));
}

#[tokio::test]
async fn remove_employee() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/remover-funcionario/7")
        .with_header("content-type", "application/json")
        .with_body(r#"{"sucesso": true, "mensagem": "Funcionário Ana (ID: 7) removido."}"#)
        .create_async()
        .await;

    let verdict = client(&server.url()).remove_employee(7).await;
    assert!(verdict.is_success());
    assert_eq!(verdict.message(), "Funcionário Ana (ID: 7) removido.");
    mock.assert_async().await;
}

#[tokio::test]
async fn check_in_and_roster_use_separate_bases() {
    let mut kiosk = mockito::Server::new_async().await;
    let mut rh = mockito::Server::new_async().await;
    let check_in = kiosk
        .mock("POST", "/registrar-ponto")
        .with_header("content-type", "application/json")
        .with_body(r#"{"sucesso": true, "mensagem": "OK"}"#)
        .create_async()
        .await;
    let listing = rh
        .mock("GET", "/funcionarios")
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let client =
        ServiceClient::new(Endpoints::new(kiosk.url(), rh.url()), Duration::from_secs(5)).unwrap();
    assert!(client.submit_check_in(&still()).await.is_success());
    assert!(client.list_employees().await.unwrap().is_empty());

    check_in.assert_async().await;
    listing.assert_async().await;
}
