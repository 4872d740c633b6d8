//! # Eviction Policy
//!
//! Seleção de vítima sob pressão de memória. A policy mantém o bookkeeping
//! auxiliar que quiser (recência, clock hand, dirty) no campo de extensão
//! por frame — tipo definido por ela via `Ext`, jamais interpretado pela
//! frame table ou pelo coordenador. Trocar de algoritmo não exige mudanças
//! nos outros componentes.

pub mod aging;

pub use aging::{AgeExt, AgingPolicy};

use crate::mmu::AccessKind;
use crate::table::FrameTable;

// =============================================================================
// TRAIT DA POLICY
// =============================================================================

/// Contrato da política de eviction.
///
/// Os hooks passivos são chamados pelo coordenador em todo evento de
/// mapeamento/acesso/eviction, sempre sob o lock da tabela; devem ser O(1)
/// amortizado para manter a latência de fault limitada, e nunca falham.
pub trait EvictionPolicy {
    /// Estado privado por frame (campo de extensão da frame table). O
    /// bound `'static` vem da própria tabela, que vive em um array
    /// estático dimensionado no boot.
    type Ext: Default + 'static;

    /// Setup único antes do primeiro uso.
    fn init(&mut self, table: &FrameTable<Self::Ext>);

    /// Escolhe a vítima: um frame evictável (mapeado, não pinado, não busy
    /// sob o lock do chamador) e seu dirty flag. `None` quando não existe
    /// frame evictável — condição fatal de OOM para o coordenador, que só
    /// chama isto depois de esgotar os frames livres.
    ///
    /// Policies que não rastreiam dirty devem reportar conservadoramente
    /// `true`.
    fn select_victim(&mut self, table: &FrameTable<Self::Ext>) -> Option<(u32, bool)>;

    /// Dirty de um frame específico (caminho de eviction explícita, onde o
    /// frame é escolhido pelo chamador e não pela policy). Padrão
    /// conservador: sempre dirty.
    fn frame_dirty(&self, _table: &FrameTable<Self::Ext>, _idx: u32) -> bool {
        true
    }

    /// Frame `idx` acabou de mapear uma página (fault resolvido).
    fn on_mapped(&mut self, table: &mut FrameTable<Self::Ext>, idx: u32, access: AccessKind);

    /// Fault espúrio/reacesso em página já residente.
    fn on_accessed(&mut self, table: &mut FrameTable<Self::Ext>, idx: u32, access: AccessKind);

    /// Frame `idx` acabou de ser evictado e desmapeado.
    fn on_evicted(&mut self, table: &mut FrameTable<Self::Ext>, idx: u32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::PhysAddr;
    use crate::frame::PageFrame;

    // Constrói a tabela através do associated type, como o coordenador faz.
    // Só compila se `Ext` satisfizer o requisito de vida da tabela.
    fn mk_table_for<P: EvictionPolicy>(n: usize) -> FrameTable<P::Ext> {
        let frames: &'static mut [PageFrame<P::Ext>] = Box::leak(
            (0..n)
                .map(|_| PageFrame::new())
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        );
        FrameTable::new(frames, PhysAddr::new(0x10_0000)).unwrap()
    }

    #[test]
    fn tabela_generica_sobre_ext_da_policy() {
        let mut policy = AgingPolicy::new();
        let table = mk_table_for::<AgingPolicy>(2);
        policy.init(&table);
        assert_eq!(table.free_frames(), 2);
        assert_eq!(policy.select_victim(&table), None);
    }
}
