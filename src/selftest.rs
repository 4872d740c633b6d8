//! Self-test do subsistema de paging
//!
//! Suites executáveis dentro do kernel (sem harness hospedado), no estilo
//! das suites de boot: cada caso devolve `TestResult` e loga via klog.
//!
//! As suites que precisam de memória estática consomem arrays `static mut`
//! dedicados; por isso `run_all()` deve ser chamado UMA única vez, durante
//! o boot, antes do subsistema real entrar em operação.

use crate::addr::{PhysAddr, VirtAddr};
use crate::backing::{BackingStore, RamBackingStore};
use crate::config::PAGE_SIZE;
use crate::frame::PageFrame;
use crate::table::FrameTable;

// =============================================================================
// FRAMEWORK
// =============================================================================

/// Resultado de um caso de teste
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,
}

/// Um caso de teste
pub struct TestCase {
    pub name: &'static str,
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }
}

/// Executa uma suite e devolve (passed, failed, skipped).
pub fn run_test_suite(name: &str, tests: &[TestCase]) -> (usize, usize, usize) {
    crate::klog!("=== Suite: ");
    crate::klog!(name);
    crate::knl!();

    let mut passed = 0;
    let mut failed = 0;
    let mut skipped = 0;

    for test in tests {
        match (test.func)() {
            TestResult::Passed => {
                crate::kok!(test.name);
                passed += 1;
            }
            TestResult::Failed => {
                crate::kfail!(test.name);
                failed += 1;
            }
            TestResult::Skipped => {
                crate::kwarn!(test.name);
                skipped += 1;
            }
        }
    }

    (passed, failed, skipped)
}

/// Executa todas as suites do subsistema. Chamar uma única vez no boot.
pub fn run_all() -> (usize, usize, usize) {
    let mut total = (0, 0, 0);
    for (name, suite) in [
        ("paging_addr", ADDR_TESTS),
        ("paging_frame", FRAME_TESTS),
        ("paging_table", TABLE_TESTS),
        ("paging_swap", SWAP_TESTS),
    ] {
        let (p, f, s) = run_test_suite(name, suite);
        total.0 += p;
        total.1 += f;
        total.2 += s;
    }

    crate::kinfo!("(SELFTEST) passed=", total.0 as u64);
    if total.1 > 0 {
        crate::kerror!("(SELFTEST) failed=", total.1 as u64);
    }
    total
}

// =============================================================================
// SUITE: ENDEREÇOS
// =============================================================================

pub const ADDR_TESTS: &[TestCase] = &[
    TestCase::new("addr_align_down", test_align_down),
    TestCase::new("addr_align_up", test_align_up),
    TestCase::new("addr_page_aligned", test_page_aligned),
];

fn test_align_down() -> TestResult {
    let v = VirtAddr::new(0x1234);
    if v.align_down() != VirtAddr::new(0x1000) {
        return TestResult::Failed;
    }
    if VirtAddr::new(0x2000).align_down() != VirtAddr::new(0x2000) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

fn test_align_up() -> TestResult {
    if VirtAddr::new(0x1001).align_up() != VirtAddr::new(0x2000) {
        return TestResult::Failed;
    }
    if VirtAddr::new(0x3000).align_up() != VirtAddr::new(0x3000) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

fn test_page_aligned() -> TestResult {
    if !PhysAddr::new(0x40_0000).is_page_aligned() {
        return TestResult::Failed;
    }
    if PhysAddr::new(0x40_0008).is_page_aligned() {
        return TestResult::Failed;
    }
    TestResult::Passed
}

// =============================================================================
// SUITE: ESTADOS DE FRAME
// =============================================================================

pub const FRAME_TESTS: &[TestCase] = &[
    TestCase::new("frame_novo_disponivel", test_frame_fresh),
    TestCase::new("frame_predicados_exclusivos", test_frame_predicates),
];

fn test_frame_fresh() -> TestResult {
    let f: PageFrame<()> = PageFrame::with_ext(());
    if !f.is_available() || f.is_mapped() || f.is_busy() || f.is_evictable() {
        return TestResult::Failed;
    }
    TestResult::Passed
}

fn test_frame_predicates() -> TestResult {
    // Disponível ⇔ nenhuma outra marca ativa.
    let f: PageFrame<()> = PageFrame::with_ext(());
    let flags = [f.is_reserved(), f.is_mapped(), f.is_pinned(), f.is_busy()];
    if f.is_available() != flags.iter().all(|&b| !b) {
        return TestResult::Failed;
    }
    TestResult::Passed
}

// =============================================================================
// SUITE: FRAME TABLE
// =============================================================================

pub const TABLE_TESTS: &[TestCase] = &[
    TestCase::new("table_ciclo_completo", test_table_cycle),
    TestCase::new("table_reservado_nunca_alocado", test_table_reserved),
];

const TABLE_BASE: u64 = 0x20_0000;
const FREE_FRAME: PageFrame<()> = PageFrame::with_ext(());

fn test_table_cycle() -> TestResult {
    static mut FRAMES: [PageFrame<()>; 4] = [FREE_FRAME; 4];
    // Único acesso a FRAMES: a suite roda uma vez.
    let frames: &'static mut [PageFrame<()>] =
        unsafe { &mut *core::ptr::addr_of_mut!(FRAMES) };

    let mut table = match FrameTable::new(frames, PhysAddr::new(TABLE_BASE)) {
        Ok(t) => t,
        Err(_) => return TestResult::Failed,
    };

    let idx = match table.claim_free() {
        Some(idx) => idx,
        None => return TestResult::Failed,
    };
    if table.mark_mapped(idx, VirtAddr::new(0x1000)).is_err() {
        return TestResult::Failed;
    }
    if !table.is_mapped(idx) || table.virt_of(idx) != Some(VirtAddr::new(0x1000)) {
        return TestResult::Failed;
    }
    if table.mark_busy(idx).is_err() || table.mark_unmapped(idx).is_err() {
        return TestResult::Failed;
    }
    if table.release(idx).is_err() {
        return TestResult::Failed;
    }
    if table.free_frames() != 4 {
        return TestResult::Failed;
    }
    TestResult::Passed
}

fn test_table_reserved() -> TestResult {
    static mut FRAMES: [PageFrame<()>; 2] = [FREE_FRAME; 2];
    let frames: &'static mut [PageFrame<()>] =
        unsafe { &mut *core::ptr::addr_of_mut!(FRAMES) };

    let mut table = match FrameTable::new(frames, PhysAddr::new(TABLE_BASE)) {
        Ok(t) => t,
        Err(_) => return TestResult::Failed,
    };
    if table.mark_reserved(0).is_err() {
        return TestResult::Failed;
    }

    // O único claim possível deve evitar o frame reservado.
    match table.claim_free() {
        Some(idx) if idx != 0 => {}
        _ => return TestResult::Failed,
    }
    if table.claim_free().is_some() {
        return TestResult::Failed;
    }
    TestResult::Passed
}

// =============================================================================
// SUITE: BACKING STORE EM RAM
// =============================================================================

pub const SWAP_TESTS: &[TestCase] = &[TestCase::new("swap_round_trip", test_swap_round_trip)];

fn test_swap_round_trip() -> TestResult {
    static mut REGION: [u8; 2 * PAGE_SIZE] = [0; 2 * PAGE_SIZE];
    let region: &'static mut [u8] = unsafe { &mut *core::ptr::addr_of_mut!(REGION) };

    let mut store: RamBackingStore<2> = RamBackingStore::new(region);
    if store.init().is_err() {
        return TestResult::Failed;
    }

    let virt = VirtAddr::new(0x5000);
    let slot = match store.location_get(virt) {
        Some(s) => s,
        None => return TestResult::Failed,
    };
    // Token estável enquanto não houver location_free.
    if store.location_get(virt) != Some(slot) {
        return TestResult::Failed;
    }

    let mut page = [0u8; PAGE_SIZE];
    for (i, b) in page.iter_mut().enumerate() {
        *b = (i & 0xFF) as u8;
    }
    store.page_out(slot, &page);

    let mut out = [0u8; PAGE_SIZE];
    store.page_in(slot, &mut out);
    if page[..] != out[..] {
        return TestResult::Failed;
    }

    store.location_free(virt);
    if store.location_query(virt).is_some() {
        return TestResult::Failed;
    }
    TestResult::Passed
}
