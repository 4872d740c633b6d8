//! Testes de integração do fault path completo: coordenador + frame table +
//! policy de aging + backing store em RAM, sobre um driver de MMU simulado.

use std::collections::HashMap;

use forge_paging::config::{PAGE_SIZE, SCRATCH_VIRT};
use forge_paging::evict::AgeExt;
use forge_paging::{
    AccessKind, AgingPolicy, MmuDriver, PageAttrs, PageFrame, PagingCoordinator, PhysAddr,
    RamBackingStore, VirtAddr,
};

// =============================================================================
// DRIVER DE MMU SIMULADO
// =============================================================================

/// MMU de mentira: a "memória física" é um buffer e os mapeamentos são um
/// dicionário virt → phys. `page_ptr` resolve para dentro do buffer, então
/// as transferências via scratch page tocam bytes de verdade.
struct TestMmu {
    ram: Box<[u8]>,
    base: u64,
    maps: HashMap<u64, u64>,
}

impl TestMmu {
    fn new(nframes: usize, base: u64) -> Self {
        Self {
            ram: vec![0u8; nframes * PAGE_SIZE].into_boxed_slice(),
            base,
            maps: HashMap::new(),
        }
    }
}

impl MmuDriver for TestMmu {
    fn map(&mut self, virt: VirtAddr, phys: PhysAddr, _attrs: PageAttrs) {
        self.maps.insert(virt.as_u64(), phys.as_u64());
    }

    fn unmap(&mut self, virt: VirtAddr) {
        self.maps.remove(&virt.as_u64());
    }

    fn invalidate_tlb(&mut self, _virt: VirtAddr) {}

    fn page_ptr(&mut self, virt: VirtAddr) -> *mut u8 {
        let phys = *self
            .maps
            .get(&virt.as_u64())
            .expect("page_ptr em endereço não mapeado");
        let off = (phys - self.base) as usize;
        self.ram[off..].as_mut_ptr()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

const BASE: u64 = 0x10_0000;
const SLOTS: usize = 16;

type Coord = PagingCoordinator<AgingPolicy, RamBackingStore<SLOTS>, TestMmu>;

fn mk_coord(nframes: usize, reserved_idx: &[usize]) -> Coord {
    let frames: &'static mut [PageFrame<AgeExt>] = Box::leak(
        (0..nframes)
            .map(|_| PageFrame::new())
            .collect::<Vec<_>>()
            .into_boxed_slice(),
    );
    let region: &'static mut [u8] = Box::leak(vec![0u8; SLOTS * PAGE_SIZE].into_boxed_slice());
    let reserved: Vec<PhysAddr> = reserved_idx
        .iter()
        .map(|i| PhysAddr::new(BASE + (*i as u64) * PAGE_SIZE as u64))
        .collect();

    PagingCoordinator::new(
        frames,
        PhysAddr::new(BASE),
        &reserved,
        VirtAddr::new(SCRATCH_VIRT),
        AgingPolicy::new(),
        RamBackingStore::new(region),
        TestMmu::new(nframes, BASE),
    )
}

fn virt(n: u64) -> VirtAddr {
    VirtAddr::new(0x40_0000 + n * PAGE_SIZE as u64)
}

/// Escreve `fill` na página residente em `v`, simulando o programa.
fn write_page(coord: &mut Coord, v: VirtAddr, fill: u8) {
    let ptr = coord.mmu().page_ptr(v);
    unsafe { std::slice::from_raw_parts_mut(ptr, PAGE_SIZE) }.fill(fill);
}

fn read_page(coord: &mut Coord, v: VirtAddr) -> Vec<u8> {
    let ptr = coord.mmu().page_ptr(v);
    unsafe { std::slice::from_raw_parts(ptr, PAGE_SIZE) }.to_vec()
}

// =============================================================================
// CENÁRIO DE REFERÊNCIA: 8 FRAMES, 2 RESERVADOS
// =============================================================================

#[test]
fn faults_frios_consomem_livres_depois_evictam() {
    let mut coord = mk_coord(8, &[0, 7]);
    assert_eq!(coord.free_frames(), 6);
    assert_eq!(coord.reserved_frames(), 2);

    // Seis faults frios: só consomem a free list.
    for n in 0..6 {
        coord.handle_fault(virt(n), AccessKind::Read);
    }
    assert_eq!(coord.free_frames(), 0);
    assert_eq!(coord.mapped_frames(), 6);
    assert_eq!(coord.stats().evictions(), 0);

    // Sétimo fault: evicta o mapeamento mais antigo (virt 0). Página nunca
    // escrita ⇒ eviction limpa, sem page-out e sem slot de swap.
    coord.handle_fault(virt(6), AccessKind::Read);
    assert_eq!(coord.mapped_frames(), 6);
    assert_eq!(coord.reserved_frames(), 2);
    assert!(coord.resident_phys(virt(0)).is_none());
    assert!(coord.resident_phys(virt(6)).is_some());

    let stats = coord.stats();
    assert_eq!(stats.faults, 7);
    assert_eq!(stats.evictions_clean, 1);
    assert_eq!(stats.evictions_dirty, 0);
    assert_eq!(stats.page_outs, 0);
    assert_eq!(stats.page_ins, 0);

    // Fault de volta em virt 0: nada armazenado ⇒ zero-fill de novo.
    coord.handle_fault(virt(0), AccessKind::Read);
    assert!(read_page(&mut coord, virt(0)).iter().all(|&b| b == 0));
    assert_eq!(coord.stats().page_ins, 0);
}

#[test]
fn conteudo_sobrevive_a_eviction_suja() {
    let mut coord = mk_coord(4, &[]);

    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0xAB);

    // Eviction explícita: dirty ⇒ page-out obrigatório.
    let phys = coord.resident_phys(virt(0)).unwrap();
    coord.evict_frame(phys);
    assert!(coord.resident_phys(virt(0)).is_none());
    assert_eq!(coord.stats().page_outs, 1);
    assert_eq!(coord.free_frames(), 4);

    // Fault de volta: page-in restaura exatamente os bytes salvos.
    coord.handle_fault(virt(0), AccessKind::Read);
    assert!(read_page(&mut coord, virt(0)).iter().all(|&b| b == 0xAB));
    assert_eq!(coord.stats().page_ins, 1);
}

#[test]
fn frame_reutilizado_nao_vaza_conteudo() {
    let mut coord = mk_coord(1, &[]);

    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0xCD);

    // O único frame é evictado (dirty) para atender o fault de virt 1; a
    // página nova deve chegar zerada, nunca com os bytes do dono anterior.
    coord.handle_fault(virt(1), AccessKind::Read);
    assert!(read_page(&mut coord, virt(1)).iter().all(|&b| b == 0));

    // E virt 0 volta do swap intacto.
    coord.handle_fault(virt(0), AccessKind::Read);
    assert!(read_page(&mut coord, virt(0)).iter().all(|&b| b == 0xCD));
}

// =============================================================================
// FAULTS ESPÚRIOS E RESIDÊNCIA
// =============================================================================

#[test]
fn enderecos_distintos_recebem_frames_distintos() {
    let mut coord = mk_coord(4, &[]);

    // Cada fault resolvido aponta para um frame próprio enquanto os
    // mapeamentos coexistirem.
    let mut frames = Vec::new();
    for n in 0..4 {
        coord.handle_fault(virt(n), AccessKind::Read);
        frames.push(coord.resident_phys(virt(n)).unwrap());
    }
    for i in 0..frames.len() {
        for j in (i + 1)..frames.len() {
            assert_ne!(frames[i], frames[j]);
        }
    }
    assert_eq!(coord.mapped_frames(), 4);
}

#[test]
fn fault_em_pagina_residente_nao_remapeia() {
    let mut coord = mk_coord(2, &[]);

    coord.handle_fault(virt(0), AccessKind::Read);
    let phys = coord.resident_phys(virt(0)).unwrap();

    coord.handle_fault(virt(0), AccessKind::Read);
    assert_eq!(coord.resident_phys(virt(0)), Some(phys));
    assert_eq!(coord.mapped_frames(), 1);

    let stats = coord.stats();
    assert_eq!(stats.faults, 2);
    assert_eq!(stats.spurious_faults, 1);
}

#[test]
fn reacesso_de_escrita_forca_page_out_na_eviction() {
    let mut coord = mk_coord(1, &[]);

    // Fault de leitura (página limpa), depois fault espúrio de escrita.
    coord.handle_fault(virt(0), AccessKind::Read);
    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0x5A);

    // A eviction para atender virt 1 deve tratar a página como suja.
    coord.handle_fault(virt(1), AccessKind::Read);
    assert_eq!(coord.stats().evictions_dirty, 1);
    assert_eq!(coord.stats().page_outs, 1);

    coord.handle_fault(virt(0), AccessKind::Read);
    assert!(read_page(&mut coord, virt(0)).iter().all(|&b| b == 0x5A));
}

#[test]
fn page_in_now_e_idempotente() {
    let mut coord = mk_coord(2, &[]);

    coord.page_in_now(virt(0));
    assert!(coord.resident_phys(virt(0)).is_some());
    let faults = coord.stats().faults;

    // Já residente: prefetch não gera fault novo.
    coord.page_in_now(virt(0));
    assert_eq!(coord.stats().faults, faults);
}

// =============================================================================
// PIN / UNPIN
// =============================================================================

#[test]
fn pagina_pinada_nunca_e_vitima() {
    let mut coord = mk_coord(2, &[]);

    coord.pin(virt(0));
    assert_eq!(coord.pinned_frames(), 1);
    let pinned_phys = coord.resident_phys(virt(0)).unwrap();

    // Pressão de memória: todas as evictions caem na outra página.
    for n in 1..5 {
        coord.handle_fault(virt(n), AccessKind::Read);
    }
    assert_eq!(coord.resident_phys(virt(0)), Some(pinned_phys));

    // Depois do unpin a página volta à população evictável.
    coord.unpin(virt(0));
    assert_eq!(coord.pinned_frames(), 0);
    coord.handle_fault(virt(5), AccessKind::Read);
    coord.handle_fault(virt(6), AccessKind::Read);
    assert!(coord.resident_phys(virt(0)).is_none());
}

#[test]
#[should_panic(expected = "PAGING OOM")]
fn sem_frame_evictavel_e_fatal() {
    let mut coord = mk_coord(2, &[]);
    coord.pin(virt(0));
    coord.pin(virt(1));

    // Nenhum frame livre, nenhum evictável: demand paging sem saída.
    coord.handle_fault(virt(2), AccessKind::Read);
}

// =============================================================================
// DISCARD E REUSO DE SWAP
// =============================================================================

#[test]
fn discard_libera_frame_e_slot() {
    let mut coord = mk_coord(2, &[]);

    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0x77);
    let phys = coord.resident_phys(virt(0)).unwrap();
    coord.evict_frame(phys);
    assert_eq!(coord.backing().slots_in_use(), 1);

    // Discard: conteúdo abandonado, slot devolvido.
    coord.discard(virt(0));
    assert_eq!(coord.backing().slots_in_use(), 0);

    // Fault de volta encontra página zerada, não o conteúdo antigo.
    coord.handle_fault(virt(0), AccessKind::Read);
    assert!(read_page(&mut coord, virt(0)).iter().all(|&b| b == 0));
}

#[test]
fn discard_de_pagina_residente_desmapeia_sem_salvar() {
    let mut coord = mk_coord(2, &[]);

    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0x33);
    assert_eq!(coord.mapped_frames(), 1);

    coord.discard(virt(0));
    assert!(coord.resident_phys(virt(0)).is_none());
    assert_eq!(coord.mapped_frames(), 0);
    assert_eq!(coord.free_frames(), 2);
    assert_eq!(coord.stats().page_outs, 0);
    assert_eq!(coord.backing().slots_in_use(), 0);
}

#[test]
fn token_de_swap_estavel_entre_evictions() {
    let mut coord = mk_coord(1, &[]);

    // Duas evictions sujas do mesmo endereço usam o mesmo slot.
    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0x01);
    coord.handle_fault(virt(1), AccessKind::Read);
    assert_eq!(coord.backing().slots_in_use(), 1);

    coord.handle_fault(virt(0), AccessKind::Write);
    write_page(&mut coord, virt(0), 0x02);
    coord.handle_fault(virt(1), AccessKind::Read);
    assert_eq!(coord.backing().slots_in_use(), 1);

    coord.handle_fault(virt(0), AccessKind::Read);
    assert!(read_page(&mut coord, virt(0)).iter().all(|&b| b == 0x02));
}

// =============================================================================
// ALINHAMENTO
// =============================================================================

#[test]
fn fault_desalinhado_resolve_a_pagina_inteira() {
    let mut coord = mk_coord(2, &[]);

    let unaligned = VirtAddr::new(virt(0).as_u64() + 0x123);
    coord.handle_fault(unaligned, AccessKind::Read);
    assert!(coord.resident_phys(virt(0)).is_some());
    assert!(coord.resident_phys(unaligned).is_some());
    assert_eq!(coord.mapped_frames(), 1);
}
