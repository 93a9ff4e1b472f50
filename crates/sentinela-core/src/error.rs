use thiserror::Error;

/// Erros comuns da biblioteca Sentinela
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Erro de comunicação com o node Ethereum
    #[error("Erro de RPC: {0}")]
    RpcError(String),
    
    /// Erro de decodificação de dados
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),
    
    /// Erro de timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),
    
    /// Recurso não encontrado
    #[error("Não encontrado: {0}")]
    NotFound(String),

    /// Inscrição da mempool encerrada ou desconectada
    #[error("Feed desconectado: {0}")]
    FeedDisconnected(String),

    /// Configuração ausente ou inválida na inicialização
    #[error("Erro de configuração: {0}")]
    ConfigurationError(String),
    
    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Indica se o erro decorre de um prazo estourado.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::TimeoutError(_))
    }
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;
