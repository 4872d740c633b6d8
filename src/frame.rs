//! # Page Frame
//!
//! Metadados de um frame físico gerenciável.

use crate::addr::VirtAddr;

// =============================================================================
// FRAME STATE
// =============================================================================

/// Estado de um frame físico gerenciável.
///
/// Versão estruturada do bit-field clássico (MAPPED/PINNED/BUSY/RESERVED):
/// cada combinação válida é um variant, e combinações inválidas simplesmente
/// não são representáveis. O link de free list ocupa o mesmo lugar que o
/// endereço virtual ocuparia em um frame mapeado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Livre: disponível para claim. `next` encadeia a free list da tabela.
    Free { next: Option<u32> },
    /// Reservado pelo hardware/firmware. Marcado uma única vez no init,
    /// nunca alocado, nunca sai deste estado.
    Reserved,
    /// Fora da free list e sem mapeamento: reivindicado para preenchimento
    /// ou no meio de uma eviction (entre mark_unmapped e mark_mapped ou
    /// release). Equivale ao bit BUSY de um frame não mapeado — nenhuma
    /// outra operação pode tocar o frame.
    InTransit,
    /// Mapeando uma página virtual. `busy` cobre o trecho de I/O da
    /// eviction; `pinned` exclui o frame da seleção de vítimas.
    Mapped {
        virt: VirtAddr,
        pinned: bool,
        busy: bool,
    },
}

// =============================================================================
// FRAME ERROR
// =============================================================================

/// Violação de pré-condição em uma transição de estado de frame.
///
/// Todas são erros de programação: o coordenador converte qualquer um
/// destes em panic fatal, nunca em caminho de recuperação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Endereço físico não alinhado a página
    NotAligned,
    /// Endereço/índice fora da faixa gerenciada
    OutOfBounds,
    /// Frame não está livre
    NotFree,
    /// Frame não está mapeado
    NotMapped,
    /// Frame não está em trânsito (claim/eviction)
    NotInTransit,
    /// Frame já está com BUSY ativo
    AlreadyBusy,
    /// Frame não está com BUSY ativo
    NotBusy,
    /// Frame é reservado (nunca participa de paging)
    Reserved,
    /// Frame está pinado (nunca evictável)
    Pinned,
}

impl FrameError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAligned => "Endereço não alinhado a página",
            Self::OutOfBounds => "Endereço fora da faixa gerenciada",
            Self::NotFree => "Frame não está livre",
            Self::NotMapped => "Frame não está mapeado",
            Self::NotInTransit => "Frame não está em trânsito",
            Self::AlreadyBusy => "Frame já está BUSY",
            Self::NotBusy => "Frame não está BUSY",
            Self::Reserved => "Frame reservado",
            Self::Pinned => "Frame pinado",
        }
    }
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações da frame table
pub type FrameResult<T> = Result<T, FrameError>;

// =============================================================================
// PAGE FRAME
// =============================================================================

/// Um registro por página física gerenciável.
///
/// `ext` é o campo de extensão privado da eviction policy: a tabela e o
/// coordenador nunca o interpretam, apenas o transportam. A policy define o
/// tipo concreto via `EvictionPolicy::Ext`.
pub struct PageFrame<E> {
    pub(crate) state: FrameState,
    pub(crate) ext: E,
}

impl<E: Default> PageFrame<E> {
    pub fn new() -> Self {
        Self {
            state: FrameState::Free { next: None },
            ext: E::default(),
        }
    }
}

impl<E> PageFrame<E> {
    /// Construtor const para arrays estáticos (self-test, tabelas de boot).
    pub const fn with_ext(ext: E) -> Self {
        Self {
            state: FrameState::Free { next: None },
            ext,
        }
    }
}

impl<E> PageFrame<E> {
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Disponível: livre, sem nenhuma marca.
    pub fn is_available(&self) -> bool {
        matches!(self.state, FrameState::Free { .. })
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self.state, FrameState::Reserved)
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.state, FrameState::Mapped { .. })
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self.state, FrameState::Mapped { pinned: true, .. })
    }

    /// BUSY: em trânsito ou mapeado com transferência em andamento.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            FrameState::InTransit | FrameState::Mapped { busy: true, .. }
        )
    }

    /// Evictável: mapeado, não pinado, não busy (reservado é excluído por
    /// construção — nunca está em `Mapped`).
    pub fn is_evictable(&self) -> bool {
        matches!(
            self.state,
            FrameState::Mapped {
                pinned: false,
                busy: false,
                ..
            }
        )
    }

    /// Endereço virtual mapeado, se houver.
    pub fn virt(&self) -> Option<VirtAddr> {
        match self.state {
            FrameState::Mapped { virt, .. } => Some(virt),
            _ => None,
        }
    }

    /// Campo de extensão da eviction policy (somente leitura).
    pub fn ext(&self) -> &E {
        &self.ext
    }

    /// Campo de extensão da eviction policy (mutável).
    pub fn ext_mut(&mut self) -> &mut E {
        &mut self.ext
    }
}

impl<E: Default> Default for PageFrame<E> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_novo_esta_disponivel() {
        let f: PageFrame<()> = PageFrame::new();
        assert!(f.is_available());
        assert!(!f.is_mapped());
        assert!(!f.is_busy());
        assert!(!f.is_evictable());
        assert_eq!(f.virt(), None);
    }

    #[test]
    fn mapeado_limpo_e_evictavel() {
        let f: PageFrame<()> = PageFrame {
            state: FrameState::Mapped {
                virt: VirtAddr::new(0x1000),
                pinned: false,
                busy: false,
            },
            ext: (),
        };
        assert!(f.is_evictable());
        assert!(!f.is_available());
        assert_eq!(f.virt(), Some(VirtAddr::new(0x1000)));
    }

    #[test]
    fn pinado_ou_busy_nao_evictavel() {
        let pinned: PageFrame<()> = PageFrame {
            state: FrameState::Mapped {
                virt: VirtAddr::new(0x1000),
                pinned: true,
                busy: false,
            },
            ext: (),
        };
        let busy: PageFrame<()> = PageFrame {
            state: FrameState::Mapped {
                virt: VirtAddr::new(0x2000),
                pinned: false,
                busy: true,
            },
            ext: (),
        };
        assert!(!pinned.is_evictable());
        assert!(pinned.is_pinned());
        assert!(!busy.is_evictable());
        assert!(busy.is_busy());
    }

    #[test]
    fn reservado_nunca_disponivel_nem_evictavel() {
        let f: PageFrame<()> = PageFrame {
            state: FrameState::Reserved,
            ext: (),
        };
        assert!(f.is_reserved());
        assert!(!f.is_available());
        assert!(!f.is_evictable());
    }
}
