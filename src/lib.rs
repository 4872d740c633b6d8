//! Forge Paging Library.
//!
//! Subsistema de **Demand Paging** do Forge Kernel: contabilidade de memória
//! física (frame table), política de eviction plugável e transporte de
//! backing store plugável, orquestrados por um coordenador que mantém as
//! invariantes de concorrência do caminho de page fault.
//!
//! ## 🏗️ Arquitetura dos Módulos
//!
//! | Módulo    | Responsabilidade | Política? |
//! |-----------|------------------|-----------|
//! | `table`   | Registros por frame físico (estado, free list). | Não — só bookkeeping. |
//! | `backing` | Move bytes entre scratch page e armazenamento durável. | Plugável (`BackingStore`). |
//! | `evict`   | Escolhe a vítima sob pressão de memória. | Plugável (`EvictionPolicy`). |
//! | `paging`  | Fault path, eviction explícita, protocolo BUSY. | Fixa — único orquestrador. |
//!
//! ## Fluxo de dependência
//!
//! ```text
//! fault trap ──▶ PagingCoordinator
//!                 │        │
//!                 ▼        ▼
//!             FrameTable  EvictionPolicy (estado privado por frame)
//!                 │
//!                 ▼
//!             ScratchPage ──▶ BackingStore (page_out / page_in)
//! ```
//!
//! O driver de MMU (mapeamento real + TLB) é um colaborador externo,
//! consumido pela trait `MmuDriver`.

#![cfg_attr(not(test), no_std)]

// --- Utilitários ---
pub mod addr; // Endereços físicos/virtuais e alinhamento
pub mod config; // Constantes de layout (PAGE_SIZE, scratch)
pub mod klog; // Logging zero-overhead (sink plugável)

// --- Componentes Centrais ---
pub mod backing; // Backing Store Transport (trait + ref. em RAM)
pub mod evict; // Eviction Policy (trait + ref. aging)
pub mod frame; // Registro por frame físico
pub mod table; // Frame Table (tradução O(1) + transições)

// --- Costuras Externas ---
pub mod mmu; // Trait do driver de page tables / TLB
pub mod scratch; // Janela scratch com escopo garantido

// --- Orquestração ---
pub mod paging; // Paging Coordinator (fault path, evict, pin)

#[cfg(feature = "self_test")]
pub mod selftest; // Suites executadas dentro do kernel

pub use addr::{PhysAddr, VirtAddr};
pub use backing::{BackingError, BackingStore, RamBackingStore, SwapSlot};
pub use evict::{AgingPolicy, EvictionPolicy};
pub use frame::{FrameError, FrameState, PageFrame};
pub use mmu::{AccessKind, MmuDriver, PageAttrs};
pub use paging::{PagingCoordinator, PagingStats};
pub use scratch::ScratchPage;
pub use table::FrameTable;
