//! DXGI 存活对象报告

use tracing::{info, warn};
use windows::Win32::Graphics::Dxgi::{
    DXGIGetDebugInterface1, IDXGIDebug1, DXGI_DEBUG_ALL, DXGI_DEBUG_RLO_FLAGS,
    DXGI_DEBUG_RLO_IGNORE_INTERNAL, DXGI_DEBUG_RLO_SUMMARY,
};

/// 输出仍然存活的 DXGI/D3D12 对象摘要
///
/// 在所有图形句柄释放之后调用。报告写到调试器输出窗口。
pub fn report_live_objects() {
    let debug: IDXGIDebug1 = match unsafe { DXGIGetDebugInterface1(0) } {
        Ok(debug) => debug,
        Err(e) => {
            warn!(error = %e, "DXGI debug interface unavailable, skipping live object report");
            return;
        }
    };

    let flags = DXGI_DEBUG_RLO_FLAGS(DXGI_DEBUG_RLO_SUMMARY.0 | DXGI_DEBUG_RLO_IGNORE_INTERNAL.0);
    match unsafe { debug.ReportLiveObjects(DXGI_DEBUG_ALL, flags) } {
        Ok(()) => info!("Live object report written to debugger output"),
        Err(e) => warn!(error = %e, "Failed to report live objects"),
    }
}
