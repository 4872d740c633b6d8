//! Endereços Físicos e Virtuais
//!
//! Newtypes para impedir a mistura acidental de espaços de endereçamento
//! dentro do subsistema de paging, mais utilitários de alinhamento a frame.

use crate::config::PAGE_SIZE;

// =============================================================================
// PHYSADDR
// =============================================================================

/// Endereço físico (base de um frame quando alinhado a página)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(u64);

impl PhysAddr {
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Valida alinhamento de frame (4KB)
    pub const fn is_page_aligned(&self) -> bool {
        self.0 % PAGE_SIZE as u64 == 0
    }

    /// Alinha endereço para baixo ao limite de frame
    pub const fn align_down(&self) -> Self {
        Self(self.0 & !(PAGE_SIZE as u64 - 1))
    }

    /// Soma um offset em bytes
    pub const fn offset(&self, bytes: u64) -> Self {
        Self(self.0 + bytes)
    }
}

// =============================================================================
// VIRTADDR
// =============================================================================

/// Endereço virtual (página de dados gerenciável ou scratch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(u64);

impl VirtAddr {
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub const fn is_page_aligned(&self) -> bool {
        self.0 % PAGE_SIZE as u64 == 0
    }

    pub const fn align_down(&self) -> Self {
        Self(self.0 & !(PAGE_SIZE as u64 - 1))
    }

    /// Alinha endereço para cima ao limite de frame
    pub const fn align_up(&self) -> Self {
        Self((self.0 + PAGE_SIZE as u64 - 1) & !(PAGE_SIZE as u64 - 1))
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_down_trunca_para_frame() {
        assert_eq!(VirtAddr::new(0x1234).align_down(), VirtAddr::new(0x1000));
        assert_eq!(VirtAddr::new(0x1000).align_down(), VirtAddr::new(0x1000));
        assert_eq!(PhysAddr::new(0xFFF).align_down(), PhysAddr::new(0));
    }

    #[test]
    fn align_up_arredonda_para_frame() {
        assert_eq!(VirtAddr::new(0x1001).align_up(), VirtAddr::new(0x2000));
        assert_eq!(VirtAddr::new(0x2000).align_up(), VirtAddr::new(0x2000));
    }

    #[test]
    fn alinhamento_de_pagina() {
        assert!(PhysAddr::new(0x4000).is_page_aligned());
        assert!(!PhysAddr::new(0x4008).is_page_aligned());
        assert!(VirtAddr::new(0).is_page_aligned());
    }
}
