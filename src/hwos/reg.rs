//! HW-RTOS register map
//!
//! Byte offsets from [`HWOS_BASE`](crate::config::HWOS_BASE). Indexed
//! registers carry their index; [`Reg::offset`] folds it into the address.

/// Stride of one context record
const CNTX_STRIDE: usize = 0x40;

const CMN: usize = 0x4000;
const SEM_TBL: usize = 0x8000;
const FLG_TBL: usize = 0x8400;
const HWISR_PNTR: usize = 0x8800;
const HWISP_OPR: usize = 0x8900;
const QINT: usize = 0x8A00;
const MBX_TBL: usize = 0x8C00;
const CPUIF: usize = 0xF000;
const QINTSEL: usize = 0x1_1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    // ============ Context records ============
    CntxType(usize),
    Prty(usize),
    CntxStat(usize),
    InitAdd(usize),
    InitR14(usize),

    // ============ Common block ============
    WtToPrescl,
    SysTim,

    // ============ Shadow tables ============
    SemTbl(usize),
    FlgTbl(usize),
    MbxTbl(usize),

    // ============ QINT ============
    HwisrPntr(usize),
    HwispOpr(usize),
    Qint,
    QintSel(usize),

    // ============ CPU interface ============
    Sysc,
    R4,
    R5,
    R6,
    R7,
    Cmd,
    R0,
    R1,
}

impl Reg {
    pub const fn offset(self) -> usize {
        match self {
            Reg::CntxType(c) => c * CNTX_STRIDE,
            Reg::Prty(c) => c * CNTX_STRIDE + 0x04,
            Reg::CntxStat(c) => c * CNTX_STRIDE + 0x08,
            Reg::InitAdd(c) => c * CNTX_STRIDE + 0x0C,
            Reg::InitR14(c) => c * CNTX_STRIDE + 0x10,

            Reg::WtToPrescl => CMN + 0x14,
            Reg::SysTim => CMN + 0x18,

            Reg::SemTbl(i) => SEM_TBL + i * 4,
            Reg::FlgTbl(i) => FLG_TBL + i * 4,
            Reg::MbxTbl(i) => MBX_TBL + i * 4,

            Reg::HwisrPntr(i) => HWISR_PNTR + i * 4,
            Reg::HwispOpr(i) => HWISP_OPR + i * 4,
            Reg::Qint => QINT,
            Reg::QintSel(i) => QINTSEL + i * 4,

            Reg::Sysc => CPUIF,
            Reg::R4 => CPUIF + 0x04,
            Reg::R5 => CPUIF + 0x08,
            Reg::R6 => CPUIF + 0x0C,
            Reg::R7 => CPUIF + 0x10,
            Reg::Cmd => CPUIF + 0x14,
            Reg::R0 => CPUIF + 0x20,
            Reg::R1 => CPUIF + 0x24,
        }
    }
}
