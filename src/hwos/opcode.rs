//! HW-RTOS system call numbers, written to `SYSC`

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(all(feature = "defmt", target_arch = "arm"), derive(defmt::Format))]
#[repr(u16)]
pub enum Opcode {
    // ============ Tasks ============
    ExtTsk = 0x4000,
    StaTsk = 0x4001,
    TerTsk = 0x4013,
    ChgPri = 0x400E,
    RelWai = 0x4014,
    SlpTsk = 0x4015,
    WupTsk = 0x4016,
    GetTid = 0x4019,
    RotRdq = 0x401E,

    // ============ Event flags ============
    CreG = 0x4002,
    DelG = 0x4003,
    WaiG = 0x4009,
    PolG = 0x400A,
    SetG = 0x400B,
    ClrG = 0x400D,

    // ============ Semaphores ============
    CreSem = 0x4004,
    DelSem = 0x4005,
    WaiSem = 0x4006,
    SigSem = 0x4007,

    // ============ Mailboxes ============
    CreMbx = 0x401A,
    DelMbx = 0x401B,
    SndMbx = 0x401C,
    RcvMbx = 0x401D,

    // ============ Dispatch control ============
    LocCpu = 0x400F,
    UnlCpu = 0x4010,
    DisDsp = 0x4011,
    EnaDsp = 0x4012,

    // ============ System time ============
    SetTim = 0x4017,
    GetTim = 0x4018,
}

impl Opcode {
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u16 as u32
    }

    /// Mnemonic used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::ExtTsk => "ext_tsk",
            Opcode::StaTsk => "sta_tsk",
            Opcode::TerTsk => "ter_tsk",
            Opcode::ChgPri => "chg_pri",
            Opcode::RelWai => "rel_wai",
            Opcode::SlpTsk => "slp_tsk",
            Opcode::WupTsk => "wup_tsk",
            Opcode::GetTid => "get_tid",
            Opcode::RotRdq => "rot_rdq",
            Opcode::CreG => "cre_flg",
            Opcode::DelG => "del_flg",
            Opcode::WaiG => "wai_flg",
            Opcode::PolG => "pol_flg",
            Opcode::SetG => "set_flg",
            Opcode::ClrG => "clr_flg",
            Opcode::CreSem => "cre_sem",
            Opcode::DelSem => "del_sem",
            Opcode::WaiSem => "wai_sem",
            Opcode::SigSem => "sig_sem",
            Opcode::CreMbx => "cre_mbx",
            Opcode::DelMbx => "del_mbx",
            Opcode::SndMbx => "snd_mbx",
            Opcode::RcvMbx => "rcv_mbx",
            Opcode::LocCpu => "loc_cpu",
            Opcode::UnlCpu => "unl_cpu",
            Opcode::DisDsp => "dis_dsp",
            Opcode::EnaDsp => "ena_dsp",
            Opcode::SetTim => "set_tim",
            Opcode::GetTim => "get_tim",
        }
    }

    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0x4000 => Opcode::ExtTsk,
            0x4001 => Opcode::StaTsk,
            0x4013 => Opcode::TerTsk,
            0x400E => Opcode::ChgPri,
            0x4014 => Opcode::RelWai,
            0x4015 => Opcode::SlpTsk,
            0x4016 => Opcode::WupTsk,
            0x4019 => Opcode::GetTid,
            0x401E => Opcode::RotRdq,
            0x4002 => Opcode::CreG,
            0x4003 => Opcode::DelG,
            0x4009 => Opcode::WaiG,
            0x400A => Opcode::PolG,
            0x400B => Opcode::SetG,
            0x400D => Opcode::ClrG,
            0x4004 => Opcode::CreSem,
            0x4005 => Opcode::DelSem,
            0x4006 => Opcode::WaiSem,
            0x4007 => Opcode::SigSem,
            0x401A => Opcode::CreMbx,
            0x401B => Opcode::DelMbx,
            0x401C => Opcode::SndMbx,
            0x401D => Opcode::RcvMbx,
            0x400F => Opcode::LocCpu,
            0x4010 => Opcode::UnlCpu,
            0x4011 => Opcode::DisDsp,
            0x4012 => Opcode::EnaDsp,
            0x4017 => Opcode::SetTim,
            0x4018 => Opcode::GetTim,
            _ => return None,
        })
    }
}
