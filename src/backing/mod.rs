//! # Backing Store Transport
//!
//! Armazenamento durável do conteúdo de páginas evictadas, endereçado por
//! token de localização (`SwapSlot`) e desacoplado da identidade do frame
//! físico. O meio concreto (flash, disco, RAM comprimida) é plugável atrás
//! da trait `BackingStore`; a referência em RAM vive em `ram`.

pub mod ram;

pub use ram::RamBackingStore;

use crate::addr::VirtAddr;
use crate::config::PAGE_SIZE;

// =============================================================================
// TOKEN DE LOCALIZAÇÃO
// =============================================================================

/// Token opaco de localização no backing store.
///
/// Associado 1:1 a um endereço virtual a partir do primeiro `location_get`
/// e estável através de evictions repetidas, até `location_free` liberar o
/// espaço para reuso por outro endereço.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSlot(u32);

impl SwapSlot {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Índice de slot (diagnóstico; o conteúdo é opaco para o coordenador).
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// ERROS DE CONFIGURAÇÃO
// =============================================================================

/// Erro de configuração do transporte, detectado no init (impede boot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingError {
    /// Região de armazenamento menor que slots × PAGE_SIZE
    StorageTooSmall,
    /// init() chamado mais de uma vez
    AlreadyInit,
}

impl BackingError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageTooSmall => "Região de swap menor que a capacidade declarada",
            Self::AlreadyInit => "Backing store já inicializado",
        }
    }
}

impl core::fmt::Display for BackingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// TRAIT DO TRANSPORTE
// =============================================================================

/// Contrato do transporte de backing store.
///
/// ## Contrato de concorrência
///
/// - `page_out`/`page_in` nunca rodam concorrentes entre si: o coordenador
///   os serializa globalmente via protocolo BUSY (interrupções podem estar
///   habilitadas durante a chamada).
/// - `location_get`/`location_free` só podem ser chamados de task context.
/// - Transferências bloqueiam (podem dormir no meio físico) e não podem
///   exigir alocação de heap.
///
/// ## Contrato de contexto (configuração)
///
/// `TASK_CONTEXT_ONLY = true` declara que o meio não opera de contexto de
/// interrupção; nesse caso o fault handler externo é responsável por adiar
/// o paging para task context. É contrato de configuração, não checagem de
/// runtime.
pub trait BackingStore {
    const TASK_CONTEXT_ONLY: bool = true;

    /// Setup único, antes de qualquer outra operação. Erro aqui é fatal de
    /// configuração (impede boot).
    fn init(&mut self) -> Result<(), BackingError>;

    /// Token para `virt`: o existente, ou um recém-reservado.
    ///
    /// Determinístico por endereço (mesmo virt ⇒ mesmo token) até
    /// `location_free`. `None` significa armazenamento esgotado — condição
    /// fatal para o chamador: o swap deve ser dimensionado ≥ páginas
    /// pagináveis em voo.
    fn location_get(&mut self, virt: VirtAddr) -> Option<SwapSlot>;

    /// Consulta sem reservar: token existente de `virt`, se houver.
    /// Distingue preenchimento cold (zero-fill) de warm (page-in).
    fn location_query(&self, virt: VirtAddr) -> Option<SwapSlot>;

    /// Invalida a associação de `virt` e descarta o conteúdo armazenado; o
    /// espaço fica reutilizável por outro endereço.
    fn location_free(&mut self, virt: VirtAddr);

    /// Copia o conteúdo da scratch page (já mapeada pelo chamador sobre o
    /// frame de origem) para a localização `slot`. Bloqueante.
    fn page_out(&mut self, slot: SwapSlot, src: &[u8; PAGE_SIZE]);

    /// Copia da localização `slot` para a scratch page (já mapeada pelo
    /// chamador sobre o frame de destino). Bloqueante.
    fn page_in(&mut self, slot: SwapSlot, dst: &mut [u8; PAGE_SIZE]);
}
