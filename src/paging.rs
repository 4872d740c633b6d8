//! Paging Coordinator
//! ==================
//!
//! Visão geral
//! -----------
//! Único componente autorizado a dirigir frame table, eviction policy e
//! backing store juntos. Possui os dois protocolos do subsistema:
//!
//! - resolução de page fault (com ou sem eviction);
//! - eviction explícita (`evict_frame`), usada fora do fault path para
//!   esvaziar um banco de RAM.
//!
//! ----------------------------------------------------------------------
//! MÁQUINA DE ESTADOS DO FAULT
//! ----------------------------------------------------------------------
//!
//! ```text
//! FAULTED ──▶ frame livre? ──sim──▶ CLAIM ──▶ fill (zero | page-in) ──▶ MAPPED
//!                │
//!                não
//!                ▼
//!        SELECT_VICTIM ──▶ MARK_BUSY ──▶ PAGE_OUT (se dirty)
//!                                          │
//!                                          ▼
//!                                    MARK_UNMAPPED ──▶ CLAIM ──▶ ...
//! ```
//!
//! Estados terminais: fault resolvido (retorna ao contexto que faltou) ou
//! abort fatal — uma vez iniciada a eviction não existe caminho de
//! recuperação nem retry.
//!
//! ----------------------------------------------------------------------
//! CONTRATOS E INVARIANTES (NÃO QUEBRE)
//! ----------------------------------------------------------------------
//!
//! 1. O lock da frame table é de curta duração: cobre leituras/transições
//!    de estado, NUNCA atravessa page-in/page-out.
//! 2. O protocolo BUSY serializa as evictions globalmente: o bit é ativado
//!    antes do I/O, só limpo depois, e nenhuma outra operação toca um
//!    frame BUSY — ordem total entre evictions sem lock adicional.
//! 3. Faults no mesmo endereço chegam serializados pelo lock de page table
//!    do fault handler externo (fora deste subsistema).
//! 4. Falha de I/O do meio, exaustão de frames evictáveis e violação de
//!    pré-condição são todos fatais. O único retorno não-fatal é sucesso.

use crate::addr::{PhysAddr, VirtAddr};
use crate::backing::BackingStore;
use crate::evict::EvictionPolicy;
use crate::frame::{FrameError, PageFrame};
use crate::mmu::{AccessKind, MmuDriver};
use crate::scratch::ScratchPage;
use crate::table::FrameTable;
use core::sync::atomic::{AtomicU64, Ordering};
use spin::Mutex;

// =============================================================================
// ESTATÍSTICAS
// =============================================================================

#[derive(Debug, Default)]
struct PagingCounters {
    faults: AtomicU64,
    spurious_faults: AtomicU64,
    evictions_clean: AtomicU64,
    evictions_dirty: AtomicU64,
    page_ins: AtomicU64,
    page_outs: AtomicU64,
}

/// Snapshot das estatísticas de paging.
#[derive(Debug, Clone, Copy)]
pub struct PagingStats {
    /// Faults atendidos (inclui espúrios)
    pub faults: u64,
    /// Faults em páginas já residentes (TLB velha / reacesso)
    pub spurious_faults: u64,
    /// Evictions sem page-out (página limpa)
    pub evictions_clean: u64,
    /// Evictions com page-out (página dirty)
    pub evictions_dirty: u64,
    /// Transferências backing → frame
    pub page_ins: u64,
    /// Transferências frame → backing
    pub page_outs: u64,
}

impl PagingStats {
    pub fn evictions(&self) -> u64 {
        self.evictions_clean + self.evictions_dirty
    }
}

// =============================================================================
// COORDENADOR
// =============================================================================

/// Orquestra fault handling, eviction e liberação explícita.
///
/// A frame table fica atrás de spinlock (diagnóstico pode ler de outros
/// cores); policy, backing store e MMU são dirigidos exclusivamente pelos
/// métodos `&mut self`, serializados pelo chamador conforme os contratos
/// do módulo.
pub struct PagingCoordinator<P, B, M>
where
    P: EvictionPolicy,
    B: BackingStore,
    M: MmuDriver,
{
    table: Mutex<FrameTable<P::Ext>>,
    policy: P,
    backing: B,
    mmu: M,
    scratch: ScratchPage,
    counters: PagingCounters,
}

impl<P, B, M> PagingCoordinator<P, B, M>
where
    P: EvictionPolicy,
    B: BackingStore,
    M: MmuDriver,
{
    // =========================================================================
    // INICIALIZAÇÃO
    // =========================================================================

    /// Monta o subsistema sobre a faixa física gerenciável.
    ///
    /// `reserved` lista os frames reservados pelo hardware (marcados
    /// permanentemente, nunca alocados). Qualquer erro aqui é de
    /// configuração e impede o boot.
    pub fn new(
        frames: &'static mut [PageFrame<P::Ext>],
        base_phys: PhysAddr,
        reserved: &[PhysAddr],
        scratch_virt: VirtAddr,
        mut policy: P,
        mut backing: B,
        mmu: M,
    ) -> Self {
        let total = frames.len();
        let mut table = match FrameTable::new(frames, base_phys) {
            Ok(t) => t,
            Err(e) => {
                crate::kerror!("(PAGING) faixa gerenciável inválida: base=", base_phys.as_u64());
                panic!("PAGING config: {}", e.as_str());
            }
        };

        for phys in reserved {
            let idx = match table.frame_for(*phys) {
                Ok(idx) => idx,
                Err(e) => {
                    crate::kerror!("(PAGING) frame reservado fora da faixa=", phys.as_u64());
                    panic!("PAGING config: {}", e.as_str());
                }
            };
            if let Err(e) = table.mark_reserved(idx) {
                crate::kerror!("(PAGING) reserva inválida, phys=", phys.as_u64());
                panic!("PAGING config: {}", e.as_str());
            }
        }

        if let Err(e) = backing.init() {
            crate::kerror!("(PAGING) backing store rejeitou init");
            panic!("PAGING config: {}", e.as_str());
        }
        policy.init(&table);

        crate::kinfo!("(PAGING) init: frames=", total as u64);
        crate::kinfo!("(PAGING) init: reservados=", table.reserved_frames() as u64);

        Self {
            table: Mutex::new(table),
            policy,
            backing,
            mmu,
            scratch: ScratchPage::new(scratch_virt),
            counters: PagingCounters::default(),
        }
    }

    // =========================================================================
    // FAULT PATH
    // =========================================================================

    /// Resolve um page fault em `virt` (chamado pelo trap handler externo,
    /// já serializado por endereço pelo lock de page table dele).
    ///
    /// Em página já residente apenas notifica a policy e revalida a
    /// tradução; upgrade de atributos (escrita em mapeamento read-only)
    /// fica com a camada de arquitetura do hospedeiro.
    ///
    /// Retorna somente em sucesso; qualquer outra condição é fatal.
    pub fn handle_fault(&mut self, virt: VirtAddr, access: AccessKind) {
        let virt = virt.align_down();
        self.counters.faults.fetch_add(1, Ordering::Relaxed);
        crate::ktrace!("(PAGING) fault virt=", virt.as_u64());

        // Passo 0: página já residente (TLB velha ou reacesso). Só notifica
        // a policy e revalida a tradução.
        {
            let mut table = self.table.lock();
            if let Some(idx) = table.find_mapped(virt) {
                if table.is_busy(idx) {
                    // O fault handler externo serializa faults por endereço;
                    // chegar aqui com BUSY ativo é bug dele.
                    crate::kerror!("(PAGING) fault em frame BUSY, virt=", virt.as_u64());
                    panic!("PAGING busy fault");
                }
                self.policy.on_accessed(&mut table, idx, access);
                drop(table);
                self.mmu.invalidate_tlb(virt);
                self.counters.spurious_faults.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }

        // Passos 1–5: obter um frame (livre ou evictando uma vítima).
        let idx = self.obtain_frame();
        let phys = self.table.lock().phys_of(idx);

        // Passo 6: preencher — warm (page-in do token existente) ou cold
        // (zero-fill de página anônima nova).
        match self.backing.location_query(virt) {
            Some(slot) => {
                crate::ktrace!("(PAGING) page-in slot=", slot.index() as u64);
                let mut window = self.scratch.window(&mut self.mmu, phys);
                self.backing.page_in(slot, window.bytes());
                drop(window);
                self.counters.page_ins.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                let mut window = self.scratch.window(&mut self.mmu, phys);
                window.zero();
            }
        }

        // Passo 7: publicar a tradução real e invalidar entrada velha.
        self.mmu.map(virt, phys, access.attrs());
        self.mmu.invalidate_tlb(virt);

        // Passo 8: frame passa a mapear `virt`, BUSY limpo, policy avisada.
        let mut table = self.table.lock();
        if let Err(e) = table.mark_mapped(idx, virt) {
            Self::die("(PAGING) mark_mapped violado, frame=", idx as u64, e);
        }
        self.policy.on_mapped(&mut table, idx, access);
    }

    /// Passos 1–5 do fault: devolve um frame em trânsito, pronto para ser
    /// preenchido e mapeado.
    fn obtain_frame(&mut self) -> u32 {
        // Passo 1: frame livre disponível — sem eviction.
        if let Some(idx) = self.table.lock().claim_free() {
            return idx;
        }

        // Passo 2: seleção de vítima. Sem vítima = OOM fatal, demand paging
        // não tem modo degradado.
        let (victim, dirty, old_virt) = {
            let mut table = self.table.lock();
            let (victim, dirty) = match self.policy.select_victim(&table) {
                Some(v) => v,
                None => {
                    crate::kerror!("(PAGING) sem frame evictável e sem frame livre!");
                    drop(table);
                    self.dump();
                    panic!("PAGING OOM");
                }
            };
            let old_virt = match table.virt_of(victim) {
                Some(v) => v,
                None => Self::die(
                    "(PAGING) vítima não mapeada, frame=",
                    victim as u64,
                    FrameError::NotMapped,
                ),
            };
            // Passo 3: BUSY exclui o frame de toda outra operação.
            if let Err(e) = table.mark_busy(victim) {
                Self::die("(PAGING) mark_busy violado, frame=", victim as u64, e);
            }
            (victim, dirty, old_virt)
        };

        crate::kdebug!("(PAGING) evict frame=", victim as u64);

        // Passo 4: página dirty precisa ser salva antes do frame mudar de
        // dono. Lock solto: o BUSY já protege o frame durante o I/O.
        if dirty {
            self.save_page(victim, old_virt);
            self.counters.evictions_dirty.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.evictions_clean.fetch_add(1, Ordering::Relaxed);
        }

        // Passo 5: retirar a tradução antiga e desfazer o mapeamento na
        // tabela; policy é avisada do frame liberado.
        self.mmu.unmap(old_virt);
        self.mmu.invalidate_tlb(old_virt);

        let mut table = self.table.lock();
        if let Err(e) = table.mark_unmapped(victim) {
            Self::die("(PAGING) mark_unmapped violado, frame=", victim as u64, e);
        }
        self.policy.on_evicted(&mut table, victim);
        victim
    }

    /// Page-out de um frame BUSY através da scratch page.
    fn save_page(&mut self, idx: u32, old_virt: VirtAddr) {
        let slot = match self.backing.location_get(old_virt) {
            Some(slot) => slot,
            None => {
                crate::kerror!("(PAGING) swap esgotado, virt=", old_virt.as_u64());
                panic!("PAGING swap full");
            }
        };
        let phys = self.table.lock().phys_of(idx);
        let mut window = self.scratch.window(&mut self.mmu, phys);
        self.backing.page_out(slot, window.bytes());
        drop(window);
        self.counters.page_outs.fetch_add(1, Ordering::Relaxed);
    }

    // =========================================================================
    // EVICTION EXPLÍCITA
    // =========================================================================

    /// Esvazia o frame em `phys` (passos 3–5 do fault para um frame
    /// escolhido pelo chamador — power management esvaziando um banco).
    ///
    /// Task context apenas quando o transporte exigir
    /// (`BackingStore::TASK_CONTEXT_ONLY`) — contrato do chamador, não
    /// checado aqui. Pré-condições violadas (frame livre, reservado,
    /// pinado ou BUSY) são fatais.
    pub fn evict_frame(&mut self, phys: PhysAddr) {
        let (idx, dirty, old_virt) = {
            let mut table = self.table.lock();
            let idx = match table.frame_for(phys) {
                Ok(idx) => idx,
                Err(e) => Self::die("(PAGING) evict_frame: phys inválido=", phys.as_u64(), e),
            };
            let old_virt = match table.virt_of(idx) {
                Some(v) => v,
                None => Self::die(
                    "(PAGING) evict_frame: frame não mapeado=",
                    phys.as_u64(),
                    FrameError::NotMapped,
                ),
            };
            let dirty = self.policy.frame_dirty(&table, idx);
            if let Err(e) = table.mark_busy(idx) {
                Self::die("(PAGING) evict_frame: mark_busy violado=", phys.as_u64(), e);
            }
            (idx, dirty, old_virt)
        };

        crate::kdebug!("(PAGING) evict explícito phys=", phys.as_u64());

        if dirty {
            self.save_page(idx, old_virt);
            self.counters.evictions_dirty.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.evictions_clean.fetch_add(1, Ordering::Relaxed);
        }

        self.mmu.unmap(old_virt);
        self.mmu.invalidate_tlb(old_virt);

        let mut table = self.table.lock();
        if let Err(e) = table.mark_unmapped(idx) {
            Self::die("(PAGING) evict_frame: unmap violado=", phys.as_u64(), e);
        }
        self.policy.on_evicted(&mut table, idx);
        // Diferente do fault path, o frame volta para a free list.
        if let Err(e) = table.release(idx) {
            Self::die("(PAGING) evict_frame: release violado=", phys.as_u64(), e);
        }
    }

    // =========================================================================
    // OPERAÇÕES AUXILIARES (task context)
    // =========================================================================

    /// Garante residência de `virt` antecipadamente (prefetch).
    pub fn page_in_now(&mut self, virt: VirtAddr) {
        let virt = virt.align_down();
        let resident = self.table.lock().find_mapped(virt).is_some();
        if !resident {
            self.handle_fault(virt, AccessKind::Read);
        }
    }

    /// Pina a página de `virt`: residente (fault-in se preciso) e nunca
    /// selecionada para eviction até `unpin`.
    pub fn pin(&mut self, virt: VirtAddr) {
        let virt = virt.align_down();
        self.page_in_now(virt);

        let mut table = self.table.lock();
        let idx = match table.find_mapped(virt) {
            Some(idx) => idx,
            None => Self::die(
                "(PAGING) pin: página ausente após fault-in=",
                virt.as_u64(),
                FrameError::NotMapped,
            ),
        };
        if let Err(e) = table.set_pinned(idx, true) {
            Self::die("(PAGING) pin violado, virt=", virt.as_u64(), e);
        }
    }

    /// Devolve a página de `virt` à população evictável.
    pub fn unpin(&mut self, virt: VirtAddr) {
        let virt = virt.align_down();
        let mut table = self.table.lock();
        let idx = match table.find_mapped(virt) {
            Some(idx) => idx,
            None => Self::die(
                "(PAGING) unpin de página ausente=",
                virt.as_u64(),
                FrameError::NotMapped,
            ),
        };
        if let Err(e) = table.set_pinned(idx, false) {
            Self::die("(PAGING) unpin violado, virt=", virt.as_u64(), e);
        }
    }

    /// Descarta a página de `virt`: desmapeia sem salvar (se residente) e
    /// libera o token de backing store. Usado quando o alocador de endereço
    /// virtual aposenta a faixa.
    pub fn discard(&mut self, virt: VirtAddr) {
        let virt = virt.align_down();
        let resident = {
            let mut table = self.table.lock();
            match table.find_mapped(virt) {
                Some(idx) => {
                    if let Err(e) = table.mark_busy(idx) {
                        Self::die("(PAGING) discard violado, virt=", virt.as_u64(), e);
                    }
                    // Sem page-out: o conteúdo está sendo abandonado.
                    if let Err(e) = table.mark_unmapped(idx) {
                        Self::die("(PAGING) discard: unmap violado=", virt.as_u64(), e);
                    }
                    self.policy.on_evicted(&mut table, idx);
                    if let Err(e) = table.release(idx) {
                        Self::die("(PAGING) discard: release violado=", virt.as_u64(), e);
                    }
                    true
                }
                None => false,
            }
        };

        if resident {
            self.mmu.unmap(virt);
            self.mmu.invalidate_tlb(virt);
        }
        self.backing.location_free(virt);
    }

    // =========================================================================
    // DIAGNÓSTICO
    // =========================================================================

    /// Frame físico que mapeia `virt`, se residente.
    pub fn resident_phys(&self, virt: VirtAddr) -> Option<PhysAddr> {
        let table = self.table.lock();
        table.find_mapped(virt.align_down()).map(|idx| table.phys_of(idx))
    }

    pub fn free_frames(&self) -> usize {
        self.table.lock().free_frames()
    }

    pub fn mapped_frames(&self) -> usize {
        self.table.lock().mapped_frames()
    }

    pub fn pinned_frames(&self) -> usize {
        self.table.lock().pinned_frames()
    }

    pub fn reserved_frames(&self) -> usize {
        self.table.lock().reserved_frames()
    }

    /// Snapshot dos contadores.
    pub fn stats(&self) -> PagingStats {
        PagingStats {
            faults: self.counters.faults.load(Ordering::Relaxed),
            spurious_faults: self.counters.spurious_faults.load(Ordering::Relaxed),
            evictions_clean: self.counters.evictions_clean.load(Ordering::Relaxed),
            evictions_dirty: self.counters.evictions_dirty.load(Ordering::Relaxed),
            page_ins: self.counters.page_ins.load(Ordering::Relaxed),
            page_outs: self.counters.page_outs.load(Ordering::Relaxed),
        }
    }

    /// Resumo da frame table via klog (caminho de halt fatal e shell de
    /// debug).
    pub fn dump(&self) {
        let table = self.table.lock();
        crate::klog!("(PAGING) frames total=", table.len() as u64);
        crate::knl!();
        crate::klog!("(PAGING) livres=", table.free_frames() as u64, " mapeados=", table.mapped_frames() as u64);
        crate::knl!();
        crate::klog!("(PAGING) reservados=", table.reserved_frames() as u64, " pinados=", table.pinned_frames() as u64);
        crate::knl!();
    }

    /// Acesso ao driver de MMU (integração com o fault handler externo).
    pub fn mmu(&mut self) -> &mut M {
        &mut self.mmu
    }

    /// Acesso ao transporte (power management / diagnóstico de swap).
    pub fn backing(&mut self) -> &mut B {
        &mut self.backing
    }

    // =========================================================================
    // INTERNOS
    // =========================================================================

    /// Violação de pré-condição: erro de programação, nunca recuperável.
    fn die(msg: &'static str, val: u64, err: FrameError) -> ! {
        crate::kerror!(msg, val);
        panic!("PAGING precondition: {}", err.as_str());
    }
}
