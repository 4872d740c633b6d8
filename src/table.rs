//! # Frame Table
//!
//! Tabela de registros por página física gerenciável: tradução O(1) entre
//! endereço físico e registro (por posição no array), predicados sobre o
//! estado e transições com pré-condição verificada.
//!
//! Puro bookkeeping — nenhuma política e nenhum I/O vivem aqui. O chamador
//! (Paging Coordinator) protege a tabela com spinlock de curta duração,
//! nunca mantido através de page-in/page-out.

use crate::addr::{PhysAddr, VirtAddr};
use crate::config::PAGE_SIZE;
use crate::frame::{FrameError, FrameResult, FrameState, PageFrame};

// =============================================================================
// ESTRUTURA PRINCIPAL
// =============================================================================

/// FrameTable - Um registro por frame físico, base + array contíguo.
///
/// O slice é fornecido pelo kernel hospedeiro no boot (array estático
/// dimensionado pela RAM gerenciável); a tabela encadeia os frames livres
/// em uma free list intrusiva dentro do próprio variant `Free`.
pub struct FrameTable<E: 'static> {
    frames: &'static mut [PageFrame<E>],
    base_phys: PhysAddr,
    free_head: Option<u32>,
    free_count: usize,
    reserved_count: usize,
}

impl<E> FrameTable<E> {
    /// Constrói a tabela sobre a faixa física gerenciável.
    ///
    /// Todos os frames entram livres e encadeados na free list. Frames
    /// reservados são marcados em seguida via `mark_reserved`, antes do
    /// primeiro `claim_free`.
    pub fn new(frames: &'static mut [PageFrame<E>], base_phys: PhysAddr) -> FrameResult<Self> {
        if !base_phys.is_page_aligned() {
            return Err(FrameError::NotAligned);
        }

        // Encadeia a free list na ordem do array (head = frame 0).
        let mut next: Option<u32> = None;
        for idx in (0..frames.len()).rev() {
            frames[idx].state = FrameState::Free { next };
            next = Some(idx as u32);
        }

        let free_count = frames.len();
        Ok(Self {
            frames,
            base_phys,
            free_head: next,
            free_count,
            reserved_count: 0,
        })
    }

    // =========================================================================
    // TRADUÇÃO FÍSICO ↔ FRAME
    // =========================================================================

    /// Índice do frame que cobre `phys`.
    ///
    /// Falha para endereço desalinhado ou fora da faixa gerenciada — sem
    /// outro modo de falha, é cálculo puro de endereço.
    pub fn frame_for(&self, phys: PhysAddr) -> FrameResult<u32> {
        if !phys.is_page_aligned() {
            return Err(FrameError::NotAligned);
        }
        if phys < self.base_phys {
            return Err(FrameError::OutOfBounds);
        }
        let index = (phys.as_u64() - self.base_phys.as_u64()) / PAGE_SIZE as u64;
        if (index as usize) < self.frames.len() {
            Ok(index as u32)
        } else {
            Err(FrameError::OutOfBounds)
        }
    }

    /// Endereço físico base do frame `idx` (derivado da posição no array).
    pub fn phys_of(&self, idx: u32) -> PhysAddr {
        debug_assert!((idx as usize) < self.frames.len());
        self.base_phys.offset(idx as u64 * PAGE_SIZE as u64)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    // =========================================================================
    // PREDICADOS
    // =========================================================================

    pub fn is_available(&self, idx: u32) -> bool {
        self.frames[idx as usize].is_available()
    }

    pub fn is_reserved(&self, idx: u32) -> bool {
        self.frames[idx as usize].is_reserved()
    }

    pub fn is_mapped(&self, idx: u32) -> bool {
        self.frames[idx as usize].is_mapped()
    }

    pub fn is_pinned(&self, idx: u32) -> bool {
        self.frames[idx as usize].is_pinned()
    }

    pub fn is_busy(&self, idx: u32) -> bool {
        self.frames[idx as usize].is_busy()
    }

    pub fn is_evictable(&self, idx: u32) -> bool {
        self.frames[idx as usize].is_evictable()
    }

    /// Endereço virtual mapeado pelo frame, se houver.
    pub fn virt_of(&self, idx: u32) -> Option<VirtAddr> {
        self.frames[idx as usize].virt()
    }

    /// Localiza o frame que mapeia `virt` (varredura linear).
    ///
    /// Invariante do subsistema: no máximo um frame mapeia cada endereço
    /// virtual, então a primeira ocorrência é a única.
    pub fn find_mapped(&self, virt: VirtAddr) -> Option<u32> {
        for (idx, frame) in self.frames.iter().enumerate() {
            if frame.virt() == Some(virt) {
                return Some(idx as u32);
            }
        }
        None
    }

    // =========================================================================
    // CONTADORES (superfície de diagnóstico)
    // =========================================================================

    pub fn free_frames(&self) -> usize {
        self.free_count
    }

    pub fn reserved_frames(&self) -> usize {
        self.reserved_count
    }

    pub fn mapped_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_mapped()).count()
    }

    pub fn pinned_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_pinned()).count()
    }

    // =========================================================================
    // TRANSIÇÕES DE ESTADO
    // =========================================================================

    /// Marca um frame livre como reservado (init apenas, uma única vez).
    ///
    /// Remove o frame da free list — O(n) no pior caso, aceitável porque só
    /// roda durante o scan de boot.
    pub fn mark_reserved(&mut self, idx: u32) -> FrameResult<()> {
        match self.frames[idx as usize].state {
            FrameState::Free { .. } => {}
            FrameState::Reserved => return Err(FrameError::Reserved),
            _ => return Err(FrameError::NotFree),
        }

        self.unlink_free(idx)?;
        self.frames[idx as usize].state = FrameState::Reserved;
        self.reserved_count += 1;
        Ok(())
    }

    /// Retira um frame da free list e o coloca em trânsito (claim direto,
    /// caminho sem eviction do fault).
    pub fn claim_free(&mut self) -> Option<u32> {
        let idx = self.free_head?;
        match self.frames[idx as usize].state {
            FrameState::Free { next } => {
                self.free_head = next;
                self.free_count -= 1;
                self.frames[idx as usize].state = FrameState::InTransit;
                Some(idx)
            }
            // Free list só encadeia frames Free.
            _ => None,
        }
    }

    /// Devolve um frame em trânsito para a free list (fim de eviction
    /// explícita ou descarte).
    pub fn release(&mut self, idx: u32) -> FrameResult<()> {
        match self.frames[idx as usize].state {
            FrameState::InTransit => {}
            _ => return Err(FrameError::NotInTransit),
        }
        self.frames[idx as usize].state = FrameState::Free {
            next: self.free_head,
        };
        self.free_head = Some(idx);
        self.free_count += 1;
        Ok(())
    }

    /// Conclui o fault: frame em trânsito passa a mapear `virt`, BUSY limpo.
    pub fn mark_mapped(&mut self, idx: u32, virt: VirtAddr) -> FrameResult<()> {
        if !virt.is_page_aligned() {
            return Err(FrameError::NotAligned);
        }
        match self.frames[idx as usize].state {
            FrameState::InTransit => {}
            FrameState::Reserved => return Err(FrameError::Reserved),
            _ => return Err(FrameError::NotInTransit),
        }
        self.frames[idx as usize].state = FrameState::Mapped {
            virt,
            pinned: false,
            busy: false,
        };
        Ok(())
    }

    /// Ativa BUSY em um frame mapeado (imediatamente antes do I/O de
    /// eviction). Exclui o frame de toda outra operação até mark_unmapped
    /// ou clear_busy.
    pub fn mark_busy(&mut self, idx: u32) -> FrameResult<()> {
        match self.frames[idx as usize].state {
            FrameState::Mapped {
                virt,
                pinned: false,
                busy: false,
            } => {
                self.frames[idx as usize].state = FrameState::Mapped {
                    virt,
                    pinned: false,
                    busy: true,
                };
                Ok(())
            }
            FrameState::Mapped { pinned: true, .. } => Err(FrameError::Pinned),
            FrameState::Mapped { busy: true, .. } | FrameState::InTransit => {
                Err(FrameError::AlreadyBusy)
            }
            FrameState::Reserved => Err(FrameError::Reserved),
            FrameState::Free { .. } => Err(FrameError::NotMapped),
        }
    }

    /// Limpa BUSY de um frame mapeado sem desfazer o mapeamento.
    pub fn clear_busy(&mut self, idx: u32) -> FrameResult<()> {
        match self.frames[idx as usize].state {
            FrameState::Mapped {
                virt,
                pinned,
                busy: true,
            } => {
                self.frames[idx as usize].state = FrameState::Mapped {
                    virt,
                    pinned,
                    busy: false,
                };
                Ok(())
            }
            FrameState::Mapped { busy: false, .. } => Err(FrameError::NotBusy),
            _ => Err(FrameError::NotMapped),
        }
    }

    /// Desfaz o mapeamento de um frame BUSY, deixando-o em trânsito.
    ///
    /// Exigir BUSY aqui é o que serializa as evictions: só a operação que
    /// ativou o bit pode desfazer o mapeamento.
    pub fn mark_unmapped(&mut self, idx: u32) -> FrameResult<()> {
        match self.frames[idx as usize].state {
            FrameState::Mapped { busy: true, .. } => {
                self.frames[idx as usize].state = FrameState::InTransit;
                Ok(())
            }
            FrameState::Mapped { busy: false, .. } => Err(FrameError::NotBusy),
            _ => Err(FrameError::NotMapped),
        }
    }

    /// Pina/despina um frame mapeado (exclui/reinclui da seleção de vítima).
    pub fn set_pinned(&mut self, idx: u32, pinned: bool) -> FrameResult<()> {
        match self.frames[idx as usize].state {
            FrameState::Mapped {
                virt, busy: false, ..
            } => {
                self.frames[idx as usize].state = FrameState::Mapped {
                    virt,
                    pinned,
                    busy: false,
                };
                Ok(())
            }
            FrameState::Mapped { busy: true, .. } => Err(FrameError::AlreadyBusy),
            _ => Err(FrameError::NotMapped),
        }
    }

    // =========================================================================
    // EXTENSÃO DA POLICY
    // =========================================================================

    /// Campo de extensão privado da eviction policy (somente leitura).
    pub fn ext(&self, idx: u32) -> &E {
        self.frames[idx as usize].ext()
    }

    /// Campo de extensão privado da eviction policy (mutável).
    pub fn ext_mut(&mut self, idx: u32) -> &mut E {
        self.frames[idx as usize].ext_mut()
    }

    // =========================================================================
    // INTERNOS
    // =========================================================================

    /// Remove `idx` da free list (usado apenas por mark_reserved no init).
    fn unlink_free(&mut self, idx: u32) -> FrameResult<()> {
        let target_next = match self.frames[idx as usize].state {
            FrameState::Free { next } => next,
            _ => return Err(FrameError::NotFree),
        };

        if self.free_head == Some(idx) {
            self.free_head = target_next;
            self.free_count -= 1;
            return Ok(());
        }

        let mut cursor = self.free_head;
        while let Some(cur) = cursor {
            let cur_next = match self.frames[cur as usize].state {
                FrameState::Free { next } => next,
                _ => return Err(FrameError::NotFree),
            };
            if cur_next == Some(idx) {
                self.frames[cur as usize].state = FrameState::Free { next: target_next };
                self.free_count -= 1;
                return Ok(());
            }
            cursor = cur_next;
        }
        Err(FrameError::OutOfBounds)
    }
}

// =============================================================================
// TESTES
// =============================================================================
