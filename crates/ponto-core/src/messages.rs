//! User-facing kiosk texts (pt-BR).

pub const CHECKIN_PROMPT: &str = "Posicione seu rosto no centro.";
pub const CHECKIN_PROCESSING: &str = "Processando reconhecimento...";
pub const CAMERA_UNAVAILABLE: &str = "Não foi possível acessar a câmera.";
pub const CAMERA_NOT_READY: &str = "A câmera ainda não está pronta.";
pub const CAPTURE_FAILED: &str = "Erro ao capturar imagem.";
pub const CHECKIN_TRANSPORT: &str = "Erro de comunicação. Tente novamente.";

pub const ENROLLMENT_INCOMPLETE: &str = "Dados ou foto ausentes. Verifique os passos.";
pub const ENROLLMENT_SENDING: &str = "Enviando dados para cadastro...";
pub const ENROLLMENT_TRANSPORT: &str = "Erro de comunicação com o servidor.";

pub const ROSTER_LOAD_FAILED: &str = "Não foi possível carregar os dados do RH.";
pub const REMOVE_TRANSPORT: &str = "Erro de comunicação ao tentar remover.";

/// Shown when the service answers `sucesso: false` without any message.
pub const UNKNOWN_REJECTION: &str = "Operação não concluída.";
