//! # Scratch Page
//!
//! Janela virtual dedicada para transferências page-in/page-out: o frame
//! alvo é mapeado na scratch page imediatamente antes do transporte rodar e
//! desmapeado imediatamente depois, evitando mapear a página alvo em si
//! durante o I/O.
//!
//! A aquisição é escopada (`ScratchWindow`): o unmap + invalidação de TLB
//! acontecem no `Drop`, em qualquer caminho de saída. Instância única e
//! global — suficiente porque page-in/page-out são globalmente serializados
//! pelo protocolo BUSY do coordenador.

use crate::addr::{PhysAddr, VirtAddr};
use crate::config::PAGE_SIZE;
use crate::mmu::{MmuDriver, PageAttrs};

// =============================================================================
// SCRATCH PAGE
// =============================================================================

/// A página virtual reservada para transferências.
pub struct ScratchPage {
    virt: VirtAddr,
}

impl ScratchPage {
    pub const fn new(virt: VirtAddr) -> Self {
        Self { virt }
    }

    pub fn virt(&self) -> VirtAddr {
        self.virt
    }

    /// Mapeia `phys` na scratch page e devolve a janela de acesso.
    pub fn window<'a, M: MmuDriver>(
        &'a self,
        mmu: &'a mut M,
        phys: PhysAddr,
    ) -> ScratchWindow<'a, M> {
        mmu.map(self.virt, phys, PageAttrs::READ | PageAttrs::WRITE);
        mmu.invalidate_tlb(self.virt);
        ScratchWindow {
            mmu,
            virt: self.virt,
        }
    }
}

// =============================================================================
// JANELA ESCOPADA
// =============================================================================

/// Janela ativa sobre um frame físico. Desmapeia no Drop.
pub struct ScratchWindow<'a, M: MmuDriver> {
    mmu: &'a mut M,
    virt: VirtAddr,
}

impl<M: MmuDriver> ScratchWindow<'_, M> {
    /// Bytes do frame mapeado, como uma página inteira.
    pub fn bytes(&mut self) -> &mut [u8; PAGE_SIZE] {
        let ptr = self.mmu.page_ptr(self.virt) as *mut [u8; PAGE_SIZE];
        // O mapeamento existe enquanto a janela existir; o ponteiro cobre
        // exatamente PAGE_SIZE bytes.
        unsafe { &mut *ptr }
    }

    /// Zera o frame através da janela (preenchimento cold / página anônima).
    pub fn zero(&mut self) {
        let ptr = self.mmu.page_ptr(self.virt) as *mut u64;
        // Escrita volátil: o frame pode estar prestes a ser publicado em
        // outra tradução de endereço.
        for i in 0..(PAGE_SIZE / core::mem::size_of::<u64>()) {
            unsafe { core::ptr::write_volatile(ptr.add(i), 0u64) };
        }
    }
}

impl<M: MmuDriver> Drop for ScratchWindow<'_, M> {
    fn drop(&mut self) {
        self.mmu.unmap(self.virt);
        self.mmu.invalidate_tlb(self.virt);
    }
}
