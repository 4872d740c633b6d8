//! # Configuração do Subsistema de Paging
//!
//! Define constantes e configurações globais do demand paging.

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Máscara para alinhar endereços a página
pub const PAGE_MASK: usize = !(PAGE_SIZE - 1);

/// Bits de offset dentro de uma página
pub const PAGE_OFFSET_BITS: usize = 12;

// =============================================================================
// LAYOUT DE MEMÓRIA VIRTUAL
// =============================================================================

/// Endereço virtual padrão da scratch page usada nas transferências
/// page-in/page-out. O bootloader reserva este slot no PML4; se o índice
/// mudar lá, este valor deve mudar junto.
pub const SCRATCH_VIRT: u64 = 0xFFFF_FE00_0000_0000;
