//! # Aging Policy
//!
//! Política de referência: aproximação de LRU por ordem de mapeamento.
//! Cada frame recebe um carimbo monotônico ao ser mapeado; a vítima é o
//! frame evictável de carimbo mais antigo. O dirty bit é rastreado pelos
//! hooks de acesso (falta de escrita ⇒ página limpa ⇒ eviction sem
//! page-out).
//!
//! Hooks O(1); `select_victim` varre a tabela sob demanda — candidatos de
//! eviction são transientes, nunca armazenados.

use super::EvictionPolicy;
use crate::mmu::AccessKind;
use crate::table::FrameTable;

// =============================================================================
// EXTENSÃO POR FRAME
// =============================================================================

/// Estado privado da policy, um por frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgeExt {
    /// Carimbo da época em que o frame foi mapeado (0 = nunca).
    stamp: u64,
    /// Conteúdo diverge do que está durável no backing store.
    dirty: bool,
}

// =============================================================================
// POLICY
// =============================================================================

/// Aproximação de LRU por idade de mapeamento.
pub struct AgingPolicy {
    clock: u64,
}

impl AgingPolicy {
    pub const fn new() -> Self {
        Self { clock: 0 }
    }
}

impl Default for AgingPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictionPolicy for AgingPolicy {
    type Ext = AgeExt;

    fn init(&mut self, _table: &FrameTable<AgeExt>) {
        self.clock = 0;
    }

    fn select_victim(&mut self, table: &FrameTable<AgeExt>) -> Option<(u32, bool)> {
        let mut best: Option<(u32, u64, bool)> = None;
        for idx in 0..table.len() as u32 {
            if !table.is_evictable(idx) {
                continue;
            }
            let ext = table.ext(idx);
            match best {
                Some((_, stamp, _)) if ext.stamp >= stamp => {}
                _ => best = Some((idx, ext.stamp, ext.dirty)),
            }
        }
        best.map(|(idx, _, dirty)| (idx, dirty))
    }

    fn frame_dirty(&self, table: &FrameTable<AgeExt>, idx: u32) -> bool {
        table.ext(idx).dirty
    }

    fn on_mapped(&mut self, table: &mut FrameTable<AgeExt>, idx: u32, access: AccessKind) {
        self.clock += 1;
        *table.ext_mut(idx) = AgeExt {
            stamp: self.clock,
            dirty: access.is_write(),
        };
    }

    fn on_accessed(&mut self, table: &mut FrameTable<AgeExt>, idx: u32, access: AccessKind) {
        if access.is_write() {
            table.ext_mut(idx).dirty = true;
        }
    }

    fn on_evicted(&mut self, table: &mut FrameTable<AgeExt>, idx: u32) {
        *table.ext_mut(idx) = AgeExt::default();
    }
}

// =============================================================================
// TESTES
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::{PhysAddr, VirtAddr};
    use crate::frame::PageFrame;

    fn mk_table(n: usize) -> FrameTable<AgeExt> {
        let frames: &'static mut [PageFrame<AgeExt>] = Box::leak(
            (0..n)
                .map(|_| PageFrame::new())
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        );
        FrameTable::new(frames, PhysAddr::new(0x10_0000)).unwrap()
    }

    fn map_one(
        table: &mut FrameTable<AgeExt>,
        policy: &mut AgingPolicy,
        virt: u64,
        access: AccessKind,
    ) -> u32 {
        let idx = table.claim_free().unwrap();
        table.mark_mapped(idx, VirtAddr::new(virt)).unwrap();
        policy.on_mapped(table, idx, access);
        idx
    }

    #[test]
    fn vitima_e_o_mapeamento_mais_antigo() {
        let mut table = mk_table(3);
        let mut policy = AgingPolicy::new();
        policy.init(&table);

        let first = map_one(&mut table, &mut policy, 0x1000, AccessKind::Read);
        map_one(&mut table, &mut policy, 0x2000, AccessKind::Read);
        map_one(&mut table, &mut policy, 0x3000, AccessKind::Read);

        let (victim, dirty) = policy.select_victim(&table).unwrap();
        assert_eq!(victim, first);
        assert!(!dirty);
    }

    #[test]
    fn fault_de_escrita_marca_dirty() {
        let mut table = mk_table(1);
        let mut policy = AgingPolicy::new();
        policy.init(&table);

        let idx = map_one(&mut table, &mut policy, 0x1000, AccessKind::Write);
        let (victim, dirty) = policy.select_victim(&table).unwrap();
        assert_eq!(victim, idx);
        assert!(dirty);
        assert!(policy.frame_dirty(&table, idx));
    }

    #[test]
    fn reacesso_de_escrita_suja_pagina_limpa() {
        let mut table = mk_table(1);
        let mut policy = AgingPolicy::new();
        policy.init(&table);

        let idx = map_one(&mut table, &mut policy, 0x1000, AccessKind::Read);
        assert!(!policy.frame_dirty(&table, idx));

        policy.on_accessed(&mut table, idx, AccessKind::Write);
        assert!(policy.frame_dirty(&table, idx));
    }

    #[test]
    fn pinado_e_busy_nunca_selecionados() {
        let mut table = mk_table(3);
        let mut policy = AgingPolicy::new();
        policy.init(&table);

        let a = map_one(&mut table, &mut policy, 0x1000, AccessKind::Read);
        let b = map_one(&mut table, &mut policy, 0x2000, AccessKind::Read);
        let c = map_one(&mut table, &mut policy, 0x3000, AccessKind::Read);

        table.set_pinned(a, true).unwrap();
        table.mark_busy(b).unwrap();

        let (victim, _) = policy.select_victim(&table).unwrap();
        assert_eq!(victim, c);

        // Só sobra o pinado + o busy: sem vítima possível.
        table.mark_busy(c).unwrap();
        assert_eq!(policy.select_victim(&table), None);
    }

    #[test]
    fn eviction_reseta_extensao() {
        let mut table = mk_table(1);
        let mut policy = AgingPolicy::new();
        policy.init(&table);

        let idx = map_one(&mut table, &mut policy, 0x1000, AccessKind::Write);
        table.mark_busy(idx).unwrap();
        table.mark_unmapped(idx).unwrap();
        policy.on_evicted(&mut table, idx);

        assert_eq!(table.ext(idx).stamp, 0);
        assert!(!table.ext(idx).dirty);
    }
}
