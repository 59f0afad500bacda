//! HR screens: roster listing, stats, removal and the enrollment wizard.

use anyhow::{bail, Result};
use ponto_core::wizard::enrollment::{EnrollmentStep, EnrollmentUpdate};
use ponto_core::{
    AttendanceService, Department, Employee, EnrollmentField, EnrollmentWizard, PontoError,
    RefreshOutcome, Roster, Stats,
};
use ponto_hw::CameraDevice;

use crate::prompt::{parse_department, Prompt};

/// Personal data given on the command line; anything missing is asked for.
#[derive(Debug, Default)]
pub struct EnrollArgs {
    pub nome: Option<String>,
    pub departamento: Option<String>,
    pub cargo: Option<String>,
}

async fn load<S: AttendanceService>(service: &S, roster: &mut Roster) -> Result<()> {
    match roster.refresh(service).await {
        RefreshOutcome::Applied | RefreshOutcome::Stale => Ok(()),
        RefreshOutcome::Failed(message) => bail!(message.text),
    }
}

pub async fn run_employees<S: AttendanceService>(service: &S, search: Option<&str>) -> Result<()> {
    let mut roster = Roster::new();
    load(service, &mut roster).await?;

    let matches = roster.filter(search.unwrap_or(""));
    if matches.is_empty() {
        println!("Nenhum funcionário encontrado.");
    }
    for employee in matches {
        println!("{}", employee_row(employee));
    }
    println!();
    println!("{}", stats_line(&roster.stats()));
    Ok(())
}

pub async fn run_stats<S: AttendanceService>(service: &S) -> Result<()> {
    let mut roster = Roster::new();
    load(service, &mut roster).await?;
    println!("{}", stats_line(&roster.stats()));
    Ok(())
}

pub async fn run_remove<S: AttendanceService>(
    service: &S,
    prompt: &mut Prompt,
    id: i64,
    yes: bool,
) -> Result<()> {
    let question = format!("Tem certeza que deseja remover o funcionário {id}?");
    if !yes && !prompt.confirm(&question).await? {
        println!("Remoção cancelada.");
        return Ok(());
    }

    let mut roster = Roster::new();
    let verdict = roster.remove(service, id).await;
    if !verdict.is_success() {
        bail!(verdict.message().to_string());
    }
    println!("{}", verdict.message());

    load(service, &mut roster).await?;
    println!("{}", stats_line(&roster.stats()));
    Ok(())
}

pub fn run_departments() {
    for (i, department) in Department::ALL.iter().enumerate() {
        println!("{:>2}. {department}", i + 1);
    }
}

pub async fn run_enroll<S, D>(
    service: &S,
    mut wizard: EnrollmentWizard<D>,
    prompt: &mut Prompt,
    args: EnrollArgs,
) -> Result<()>
where
    S: AttendanceService,
    D: CameraDevice,
{
    let departamento = args.departamento.map(|raw| match parse_department(&raw) {
        Some(department) => department.as_str().to_string(),
        None => raw,
    });
    let given = [
        (EnrollmentField::Nome, args.nome),
        (EnrollmentField::Departamento, departamento),
        (EnrollmentField::Cargo, args.cargo),
    ];
    for (field, value) in given {
        if let Some(value) = value {
            wizard.set_field(field, &value)?;
        }
    }

    let mut revisiting = false;
    while !wizard.is_closed() {
        let step = wizard.step().clone();
        println!();
        println!("Passo {}: {}", step.number(), step_title(&step));
        if let Some(status) = wizard.status() {
            println!("{}", status.text);
        }

        match step {
            EnrollmentStep::PersonalData => {
                personal_data(&mut wizard, prompt, revisiting).await?;
                revisiting = true;
            }
            EnrollmentStep::Capture => {
                let answer = prompt
                    .ask("[Enter] capturar foto, [v] voltar, [c] cancelar: ")
                    .await?;
                match answer.as_deref() {
                    None | Some("c") => wizard.cancel(),
                    Some("v") => report(wizard.back()),
                    Some(_) => {
                        if let Err(e) = wizard.capture() {
                            tracing::warn!(error = %e, "enrollment capture failed");
                        }
                    }
                }
            }
            EnrollmentStep::Confirm => {
                print_summary(&wizard);
                let answer = prompt
                    .ask("[s] salvar, [r] nova foto, [v] voltar, [c] cancelar: ")
                    .await?;
                match answer.as_deref() {
                    Some("s") => submit(service, &mut wizard).await?,
                    Some("r") => report(wizard.recapture()),
                    Some("v") => report(wizard.back()),
                    None | Some("c") => wizard.cancel(),
                    Some(other) => println!("Opção inválida: {other}"),
                }
            }
            EnrollmentStep::Completed { .. } => {
                if let Some(deadline) = wizard.return_deadline() {
                    tokio::time::sleep_until(deadline.into()).await;
                }
                if wizard.poll_timers(crate::now()) {
                    let mut roster = Roster::new();
                    load(service, &mut roster).await?;
                    println!("{}", stats_line(&roster.stats()));
                }
            }
            EnrollmentStep::Submitting => bail!("enrollment left submitting"),
        }
    }
    Ok(())
}

/// Camera failures keep the wizard on the capture step with the error shown.
fn report(result: Result<(), PontoError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "enrollment step failed");
    }
}

fn step_title(step: &EnrollmentStep) -> &'static str {
    match step {
        EnrollmentStep::PersonalData => "Dados pessoais",
        EnrollmentStep::Capture => "Captura de foto",
        EnrollmentStep::Confirm | EnrollmentStep::Submitting => "Confirmação",
        EnrollmentStep::Completed { .. } => "Concluído",
    }
}

async fn personal_data<D: CameraDevice>(
    wizard: &mut EnrollmentWizard<D>,
    prompt: &mut Prompt,
    revisiting: bool,
) -> Result<()> {
    let mut fields = wizard.form().missing();
    if fields.is_empty() && revisiting && prompt.confirm("Alterar dados?").await? {
        fields = vec![
            EnrollmentField::Nome,
            EnrollmentField::Departamento,
            EnrollmentField::Cargo,
        ];
    }

    for field in fields {
        let value = match field {
            EnrollmentField::Departamento => {
                run_departments();
                let Some(answer) = prompt.ask("Departamento (número ou nome): ").await? else {
                    wizard.cancel();
                    return Ok(());
                };
                match parse_department(&answer) {
                    Some(department) => department.as_str().to_string(),
                    None => {
                        println!("Departamento inválido: {answer}");
                        continue;
                    }
                }
            }
            EnrollmentField::Nome | EnrollmentField::Cargo => {
                let label = if field == EnrollmentField::Nome { "Nome" } else { "Cargo" };
                let Some(answer) = prompt.ask(&format!("{label}: ")).await? else {
                    wizard.cancel();
                    return Ok(());
                };
                answer
            }
        };
        wizard.set_field(field, &value)?;
    }

    if wizard.form().is_complete() {
        report(wizard.next());
    }
    Ok(())
}

async fn submit<S, D>(service: &S, wizard: &mut EnrollmentWizard<D>) -> Result<()>
where
    S: AttendanceService,
    D: CameraDevice,
{
    let pending = match wizard.begin_submit() {
        Ok(pending) => pending,
        Err(e) => {
            tracing::info!(error = %e, "enrollment not submitted");
            return Ok(());
        }
    };
    if let Some(status) = wizard.status() {
        println!("{}", status.text);
    }

    let update = tokio::select! {
        verdict = service.submit_enrollment(&pending.form, &pending.image) => {
            wizard.finish(pending.ticket, verdict, crate::now())
        }
        _ = tokio::signal::ctrl_c() => {
            wizard.cancel();
            println!("Cadastro cancelado.");
            return Ok(());
        }
    };

    match update {
        EnrollmentUpdate::Enrolled { .. } | EnrollmentUpdate::Discarded => {}
        EnrollmentUpdate::Retry { error } => {
            tracing::debug!(%error, "enrollment will be retried");
        }
    }
    Ok(())
}

fn print_summary<D: CameraDevice>(wizard: &EnrollmentWizard<D>) {
    let form = wizard.form();
    println!("Nome: {}", form.nome);
    println!(
        "Departamento: {}",
        form.departamento.map(|d| d.as_str()).unwrap_or("-")
    );
    println!("Cargo: {}", form.cargo);
    if let Some(image) = wizard.image() {
        let (w, h) = image.dimensions();
        println!("Foto: {w}x{h} ({} bytes)", image.len());
    }
}

fn employee_row(e: &Employee) -> String {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    format!(
        "{:>5}  [{}] {}  | {} | {} | {} | {}",
        e.id,
        e.initials(),
        e.nome,
        or_dash(&e.departamento),
        or_dash(&e.cargo),
        or_dash(&e.status),
        or_dash(&e.admissao),
    )
}

fn stats_line(stats: &Stats) -> String {
    format!(
        "Total: {}  Ativos: {}  Inativos: {}  Departamentos: {}",
        stats.total, stats.ativos, stats.inativos, stats.departamentos
    )
}
