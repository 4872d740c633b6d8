// =============================================================================
// PAGING LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do subsistema de paging com custo ZERO em release.
//
// ARQUITETURA:
// Este sistema foi projetado para ser completamente removível em release:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Evita geração de código SSE/AVX
// - SEM alocação - Apenas strings literais + hex
//
// Diferente do kernel (que escreve direto na serial), esta crate não possui
// camada de drivers: o kernel hospedeiro instala um sink via `set_sink()`
// durante o boot. Sem sink instalado, os emit_* são no-ops.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Erros fatais ou críticos
// - WARN:  Situações suspeitas
// - INFO:  Fluxo normal de execução
// - DEBUG: Informações de debugging
// - TRACE: Detalhes extremos (cada fault/eviction)
//
// COMO USAR:
//   kinfo!("(PAGING) Inicializando...");       // Apenas string
//   kinfo!("(PAGING) Addr=", 0x1000);          // String + hex
//   klog!("Frames=", total, " Livres=", free); // Múltiplos valores
//
// =============================================================================

/// Sink de saída instalado pelo kernel hospedeiro (ex.: serial COM1).
pub type LogSink = fn(&str);

static SINK: spin::Once<LogSink> = spin::Once::new();

/// Instala o sink de log. Primeira chamada vence; chamadas seguintes são
/// ignoradas (mesma semântica de init única do resto do subsistema).
pub fn set_sink(sink: LogSink) {
    SINK.call_once(|| sink);
}

/// Emite uma string crua no sink (no-op sem sink instalado).
pub fn emit_str(s: &str) {
    if let Some(sink) = SINK.get() {
        sink(s);
    }
}

/// Emite um u64 em hexadecimal (prefixo 0x, sem zeros à esquerda).
///
/// Implementado sem core::fmt: conversão manual em buffer de pilha.
pub fn emit_hex(value: u64) {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut buf = [0u8; 18];
    buf[0] = b'0';
    buf[1] = b'x';

    let mut len = 2;
    let mut started = false;
    let mut shift = 64;
    while shift > 0 {
        shift -= 4;
        let nib = ((value >> shift) & 0xF) as usize;
        if nib != 0 || started || shift == 0 {
            buf[len] = DIGITS[nib];
            len += 1;
            started = true;
        }
    }

    // Buffer construído byte a byte a partir de DIGITS, sempre ASCII.
    if let Ok(s) = core::str::from_utf8(&buf[..len]) {
        emit_str(s);
    }
}

/// Emite newline (\r\n).
pub fn emit_nl() {
    emit_str("\r\n");
}

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    // Apenas string literal
    ($msg:expr) => {{
        $crate::klog::emit_str($crate::klog::P_ERROR);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
    // String + valor hex
    ($msg:expr, $val:expr) => {{
        $crate::klog::emit_str($crate::klog::P_ERROR);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_hex($val as u64);
        $crate::klog::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::klog::emit_str($crate::klog::P_WARN);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klog::emit_str($crate::klog::P_WARN);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_hex($val as u64);
        $crate::klog::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::klog::emit_str($crate::klog::P_INFO);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klog::emit_str($crate::klog::P_INFO);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_hex($val as u64);
        $crate::klog::emit_nl();
    }};
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(any(feature = "log_trace", feature = "log_debug"))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::klog::emit_str($crate::klog::P_DEBUG);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klog::emit_str($crate::klog::P_DEBUG);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_hex($val as u64);
        $crate::klog::emit_nl();
    }};
}

#[cfg(not(any(feature = "log_trace", feature = "log_debug")))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================

#[cfg(feature = "log_trace")]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::klog::emit_str($crate::klog::P_TRACE);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klog::emit_str($crate::klog::P_TRACE);
        $crate::klog::emit_str($msg);
        $crate::klog::emit_hex($val as u64);
        $crate::klog::emit_nl();
    }};
}

#[cfg(not(feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível.
///
/// Útil para construir linhas compostas (ex.: dump da frame table).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    // Apenas string
    ($msg:expr) => {{
        $crate::klog::emit_str($msg);
    }};
    // String + hex
    ($msg:expr, $val:expr) => {{
        $crate::klog::emit_str($msg);
        $crate::klog::emit_hex($val as u64);
    }};
    // String + hex + string
    ($msg1:expr, $val:expr, $msg2:expr) => {{
        $crate::klog::emit_str($msg1);
        $crate::klog::emit_hex($val as u64);
        $crate::klog::emit_str($msg2);
    }};
    // String + hex + string + hex
    ($msg1:expr, $val1:expr, $msg2:expr, $val2:expr) => {{
        $crate::klog::emit_str($msg1);
        $crate::klog::emit_hex($val1 as u64);
        $crate::klog::emit_str($msg2);
        $crate::klog::emit_hex($val2 as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($t:tt)*) => {{}};
}

/// knl! - Emite apenas newline.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::klog::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::klog::emit_str("\x1b[32m[OK]\x1b[0m ");
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($t:tt)*) => {{}};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::klog::emit_str("\x1b[1;31m[FAIL]\x1b[0m ");
        $crate::klog::emit_str($msg);
        $crate::klog::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($t:tt)*) => {{}};
}
