//! # Backing Store em RAM
//!
//! Transporte de referência: uma região estática de RAM dividida em SLOTS
//! páginas, com tabela de donos de tamanho fixo (sem heap). Serve de swap
//! de verdade em sistemas com RAM dedicada e de meio padrão para exercitar
//! o fault path inteiro em desenvolvimento.

use super::{BackingError, BackingStore, SwapSlot};
use crate::addr::VirtAddr;
use crate::config::PAGE_SIZE;

// =============================================================================
// ESTRUTURA PRINCIPAL
// =============================================================================

/// Transporte de backing store sobre uma região de RAM.
///
/// `SLOTS` é a capacidade em páginas; a região fornecida no construtor deve
/// ter pelo menos `SLOTS * PAGE_SIZE` bytes (validado no init).
pub struct RamBackingStore<const SLOTS: usize> {
    store: &'static mut [u8],
    /// Dono de cada slot (None = livre). Busca linear: SLOTS é pequeno e a
    /// tabela cabe em cache.
    owners: [Option<VirtAddr>; SLOTS],
    initialized: bool,
}

impl<const SLOTS: usize> RamBackingStore<SLOTS> {
    /// Constrói o transporte sobre `region`. A validação de tamanho fica
    /// para o `init()` (erro de configuração, fatal no boot).
    pub fn new(region: &'static mut [u8]) -> Self {
        Self {
            store: region,
            owners: [None; SLOTS],
            initialized: false,
        }
    }

    /// Slots atualmente reservados (diagnóstico).
    pub fn slots_in_use(&self) -> usize {
        self.owners.iter().filter(|o| o.is_some()).count()
    }

    /// Capacidade total em páginas.
    pub fn capacity(&self) -> usize {
        SLOTS
    }

    fn slot_bytes(&mut self, slot: SwapSlot) -> &mut [u8] {
        let start = slot.index() * PAGE_SIZE;
        &mut self.store[start..start + PAGE_SIZE]
    }
}

impl<const SLOTS: usize> BackingStore for RamBackingStore<SLOTS> {
    // RAM opera de qualquer contexto; transportes sobre flash/disco devem
    // sobrescrever para true.
    const TASK_CONTEXT_ONLY: bool = false;

    fn init(&mut self) -> Result<(), BackingError> {
        if self.initialized {
            return Err(BackingError::AlreadyInit);
        }
        if self.store.len() < SLOTS * PAGE_SIZE {
            return Err(BackingError::StorageTooSmall);
        }
        self.initialized = true;
        crate::kinfo!("(SWAP) RamBackingStore pronto, slots=", SLOTS as u64);
        Ok(())
    }

    fn location_get(&mut self, virt: VirtAddr) -> Option<SwapSlot> {
        debug_assert!(virt.is_page_aligned());

        // Token existente vence (determinismo por endereço).
        let mut free = None;
        for (i, owner) in self.owners.iter().enumerate() {
            match owner {
                Some(v) if *v == virt => return Some(SwapSlot::new(i as u32)),
                None if free.is_none() => free = Some(i),
                _ => {}
            }
        }

        match free {
            Some(i) => {
                self.owners[i] = Some(virt);
                crate::ktrace!("(SWAP) slot reservado=", i as u64);
                Some(SwapSlot::new(i as u32))
            }
            None => {
                crate::kerror!("(SWAP) armazenamento esgotado, virt=", virt.as_u64());
                None
            }
        }
    }

    fn location_query(&self, virt: VirtAddr) -> Option<SwapSlot> {
        for (i, owner) in self.owners.iter().enumerate() {
            if *owner == Some(virt) {
                return Some(SwapSlot::new(i as u32));
            }
        }
        None
    }

    fn location_free(&mut self, virt: VirtAddr) {
        for owner in self.owners.iter_mut() {
            if *owner == Some(virt) {
                // Conteúdo é descartado junto com a associação.
                *owner = None;
                crate::ktrace!("(SWAP) slot liberado, virt=", virt.as_u64());
                return;
            }
        }
    }

    fn page_out(&mut self, slot: SwapSlot, src: &[u8; PAGE_SIZE]) {
        debug_assert!(self.owners[slot.index()].is_some());
        self.slot_bytes(slot).copy_from_slice(src);
    }

    fn page_in(&mut self, slot: SwapSlot, dst: &mut [u8; PAGE_SIZE]) {
        debug_assert!(self.owners[slot.index()].is_some());
        let start = slot.index() * PAGE_SIZE;
        dst.copy_from_slice(&self.store[start..start + PAGE_SIZE]);
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_store<const SLOTS: usize>() -> RamBackingStore<SLOTS> {
        let region: &'static mut [u8] =
            Box::leak(vec![0u8; SLOTS * PAGE_SIZE].into_boxed_slice());
        let mut store = RamBackingStore::new(region);
        store.init().unwrap();
        store
    }

    #[test]
    fn init_valida_tamanho_da_regiao() {
        let region: &'static mut [u8] = Box::leak(vec![0u8; PAGE_SIZE].into_boxed_slice());
        let mut store: RamBackingStore<4> = RamBackingStore::new(region);
        assert_eq!(store.init(), Err(BackingError::StorageTooSmall));
    }

    #[test]
    fn init_duplo_e_erro() {
        let mut store = mk_store::<2>();
        assert_eq!(store.init(), Err(BackingError::AlreadyInit));
    }

    #[test]
    fn token_idempotente_sem_free() {
        let mut store = mk_store::<4>();
        let v = VirtAddr::new(0x4000);
        let a = store.location_get(v).unwrap();
        let b = store.location_get(v).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.location_query(v), Some(a));
        assert_eq!(store.slots_in_use(), 1);
    }

    #[test]
    fn query_nao_reserva() {
        let store = mk_store::<4>();
        assert_eq!(store.location_query(VirtAddr::new(0x9000)), None);
        assert_eq!(store.slots_in_use(), 0);
    }

    #[test]
    fn free_permite_reuso_por_outro_endereco() {
        let mut store = mk_store::<1>();
        let v1 = VirtAddr::new(0x1000);
        let v2 = VirtAddr::new(0x2000);

        let slot = store.location_get(v1).unwrap();
        // Capacidade 1: outro endereço não cabe.
        assert_eq!(store.location_get(v2), None);

        store.location_free(v1);
        let reused = store.location_get(v2).unwrap();
        assert_eq!(reused.index(), slot.index());
        assert_eq!(store.location_query(v1), None);
    }

    #[test]
    fn round_trip_de_conteudo() {
        let mut store = mk_store::<2>();
        let v = VirtAddr::new(0x7000);
        let slot = store.location_get(v).unwrap();

        let mut page = [0u8; PAGE_SIZE];
        for (i, b) in page.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
        store.page_out(slot, &page);

        let mut out = [0u8; PAGE_SIZE];
        store.page_in(slot, &mut out);
        assert_eq!(page[..], out[..]);
    }

    #[test]
    fn slots_independentes() {
        let mut store = mk_store::<2>();
        let s1 = store.location_get(VirtAddr::new(0x1000)).unwrap();
        let s2 = store.location_get(VirtAddr::new(0x2000)).unwrap();
        assert_ne!(s1, s2);

        store.page_out(s1, &[0xAA; PAGE_SIZE]);
        store.page_out(s2, &[0x55; PAGE_SIZE]);

        let mut out = [0u8; PAGE_SIZE];
        store.page_in(s1, &mut out);
        assert!(out.iter().all(|&b| b == 0xAA));
        store.page_in(s2, &mut out);
        assert!(out.iter().all(|&b| b == 0x55));
    }
}
