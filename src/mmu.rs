//! # Driver de MMU (costura externa)
//!
//! O mapeamento real de page tables e a invalidação de TLB pertencem ao
//! driver de arquitetura do kernel hospedeiro. O subsistema de paging
//! consome esse driver pela trait `MmuDriver`: síncrono e sempre
//! bem-sucedido para faixas de endereço válidas — falha aqui é bug do
//! driver, não condição tratável deste subsistema.

use crate::addr::{PhysAddr, VirtAddr};
use bitflags::bitflags;

// =============================================================================
// FLAGS DE MAPEAMENTO
// =============================================================================

bitflags! {
    /// Atributos de acesso de um mapeamento de página.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageAttrs: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
    }
}

// =============================================================================
// TIPO DE ACESSO
// =============================================================================

/// Tipo de acesso que causou o fault (fornecido pelo trap handler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Execute,
}

impl AccessKind {
    /// Atributos mínimos para resolver um fault deste tipo.
    pub fn attrs(&self) -> PageAttrs {
        match self {
            AccessKind::Read => PageAttrs::READ,
            AccessKind::Write => PageAttrs::READ | PageAttrs::WRITE,
            AccessKind::Execute => PageAttrs::READ | PageAttrs::EXEC,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, AccessKind::Write)
    }
}

// =============================================================================
// TRAIT DO DRIVER
// =============================================================================

/// Contrato do driver de page tables / TLB consumido pelo coordenador.
///
/// O coordenador só cria mapeamentos ao resolver um fault; upgrade de
/// atributos de uma página já residente (ex.: fault de escrita em
/// mapeamento read-only) é responsabilidade da camada de arquitetura do
/// kernel hospedeiro, antes ou depois de chamar o coordenador.
pub trait MmuDriver {
    /// Cria o mapeamento `virt` → `phys` com os atributos dados.
    fn map(&mut self, virt: VirtAddr, phys: PhysAddr, attrs: PageAttrs);

    /// Remove o mapeamento de `virt` (marca not-present).
    fn unmap(&mut self, virt: VirtAddr);

    /// Invalida a entrada de TLB de `virt` (invlpg ou equivalente).
    fn invalidate_tlb(&mut self, virt: VirtAddr);

    /// Ponteiro para os bytes de uma página atualmente mapeada em `virt`.
    ///
    /// No kernel isto é o próprio endereço virtual; em testes hospedados o
    /// mock resolve para um buffer. Válido apenas enquanto o mapeamento
    /// existir.
    fn page_ptr(&mut self, virt: VirtAddr) -> *mut u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atributos_por_tipo_de_acesso() {
        assert_eq!(AccessKind::Read.attrs(), PageAttrs::READ);
        assert!(AccessKind::Write.attrs().contains(PageAttrs::WRITE));
        assert!(AccessKind::Execute.attrs().contains(PageAttrs::EXEC));
        assert!(AccessKind::Write.is_write());
        assert!(!AccessKind::Read.is_write());
    }
}
