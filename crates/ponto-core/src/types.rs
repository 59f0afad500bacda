use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FormError;

/// The fixed set of departments an employee can be enrolled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Diretoria/Executivo")]
    Diretoria,
    #[serde(rename = "Administrativo e Financeiro")]
    AdministrativoFinanceiro,
    #[serde(rename = "Recursos Humanos")]
    RecursosHumanos,
    #[serde(rename = "Marketing e Vendas")]
    MarketingVendas,
    #[serde(rename = "Operações")]
    Operacoes,
    #[serde(rename = "Tecnologia da Informação (TI)")]
    TecnologiaInformacao,
    #[serde(rename = "Jurídico e Compliance")]
    JuridicoCompliance,
    #[serde(rename = "Atendimento ao Cliente")]
    AtendimentoCliente,
    #[serde(rename = "Pesquisa e Desenvolvimento (P&D)")]
    PesquisaDesenvolvimento,
}

impl Department {
    pub const ALL: [Department; 9] = [
        Department::Diretoria,
        Department::AdministrativoFinanceiro,
        Department::RecursosHumanos,
        Department::MarketingVendas,
        Department::Operacoes,
        Department::TecnologiaInformacao,
        Department::JuridicoCompliance,
        Department::AtendimentoCliente,
        Department::PesquisaDesenvolvimento,
    ];

    /// Wire/display name, as the remote service stores it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Diretoria => "Diretoria/Executivo",
            Department::AdministrativoFinanceiro => "Administrativo e Financeiro",
            Department::RecursosHumanos => "Recursos Humanos",
            Department::MarketingVendas => "Marketing e Vendas",
            Department::Operacoes => "Operações",
            Department::TecnologiaInformacao => "Tecnologia da Informação (TI)",
            Department::JuridicoCompliance => "Jurídico e Compliance",
            Department::AtendimentoCliente => "Atendimento ao Cliente",
            Department::PesquisaDesenvolvimento => "Pesquisa e Desenvolvimento (P&D)",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Department {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Department::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| FormError::UnknownDepartment(s.to_string()))
    }
}

/// Fields of the personal-data step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentField {
    Nome,
    Departamento,
    Cargo,
}

impl EnrollmentField {
    /// Multipart field name.
    pub fn wire_name(&self) -> &'static str {
        match self {
            EnrollmentField::Nome => "nome",
            EnrollmentField::Departamento => "departamento",
            EnrollmentField::Cargo => "cargo",
        }
    }
}

/// Personal data collected by the enrollment wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentForm {
    pub nome: String,
    pub departamento: Option<Department>,
    pub cargo: String,
}

impl EnrollmentForm {
    /// Set one field from raw input. An empty department clears the selection.
    pub fn set(&mut self, field: EnrollmentField, value: &str) -> Result<(), FormError> {
        match field {
            EnrollmentField::Nome => self.nome = value.to_string(),
            EnrollmentField::Cargo => self.cargo = value.to_string(),
            EnrollmentField::Departamento => {
                self.departamento = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                };
            }
        }
        Ok(())
    }

    /// Fields that are still blank, in form order.
    pub fn missing(&self) -> Vec<EnrollmentField> {
        let mut missing = Vec::new();
        if self.nome.trim().is_empty() {
            missing.push(EnrollmentField::Nome);
        }
        if self.departamento.is_none() {
            missing.push(EnrollmentField::Departamento);
        }
        if self.cargo.trim().is_empty() {
            missing.push(EnrollmentField::Cargo);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// One row of the roster, as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub nome: String,
    #[serde(default)]
    pub departamento: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub admissao: Option<String>,
}

impl Employee {
    /// Up to two uppercase initials of the name.
    pub fn initials(&self) -> String {
        self.nome
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Case-insensitive name/department match, or id substring match.
    pub fn matches(&self, term: &str) -> bool {
        let term_lower = term.to_lowercase();
        self.nome.to_lowercase().contains(&term_lower)
            || self
                .departamento
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term_lower))
            || self.id.to_string().contains(term)
    }
}

/// Roster summary counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub ativos: u64,
    #[serde(default)]
    pub inativos: u64,
    #[serde(default)]
    pub departamentos: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
    Success,
}

/// Text shown to the user until the next transition replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_round_trips_through_name() {
        for dept in Department::ALL {
            assert_eq!(dept.as_str().parse::<Department>().unwrap(), dept);
        }
    }

    #[test]
    fn test_department_rejects_unknown() {
        let err = "Cozinha".parse::<Department>().unwrap_err();
        assert!(matches!(err, FormError::UnknownDepartment(ref d) if d == "Cozinha"));
    }

    #[test]
    fn test_department_serializes_as_display_name() {
        let json = serde_json::to_string(&Department::Operacoes).unwrap();
        assert_eq!(json, "\"Operações\"");
    }

    #[test]
    fn test_form_set_and_missing() {
        let mut form = EnrollmentForm::default();
        assert_eq!(form.missing().len(), 3);

        form.set(EnrollmentField::Nome, "Ana Souza").unwrap();
        form.set(EnrollmentField::Departamento, "Recursos Humanos")
            .unwrap();
        assert_eq!(form.missing(), vec![EnrollmentField::Cargo]);

        form.set(EnrollmentField::Cargo, "Analista").unwrap();
        assert!(form.is_complete());
    }

    #[test]
    fn test_form_rejects_unknown_department_and_keeps_previous() {
        let mut form = EnrollmentForm::default();
        form.set(EnrollmentField::Departamento, "Operações").unwrap();
        assert!(form.set(EnrollmentField::Departamento, "Marte").is_err());
        assert_eq!(form.departamento, Some(Department::Operacoes));
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let mut form = EnrollmentForm::default();
        form.set(EnrollmentField::Nome, "   ").unwrap();
        assert!(form.missing().contains(&EnrollmentField::Nome));
    }

    #[test]
    fn test_employee_deserializes_with_nulls() {
        let json = r#"{"id": 7, "nome": "João da Silva", "departamento": null,
                       "cargo": "Técnico", "status": null, "admissao": "01/02/2024"}"#;
        let emp: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(emp.id, 7);
        assert_eq!(emp.departamento, None);
        assert_eq!(emp.initials(), "JD");
    }

    #[test]
    fn test_employee_matches() {
        let emp = Employee {
            id: 42,
            nome: "Maria Oliveira".into(),
            departamento: Some("Operações".into()),
            cargo: None,
            status: Some("Ativo".into()),
            admissao: None,
        };
        assert!(emp.matches("maria"));
        assert!(emp.matches("OPERA"));
        assert!(emp.matches("4"));
        assert!(!emp.matches("financeiro"));
    }
}
