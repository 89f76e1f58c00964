use bitfield::bitfield;

bitfield! {
    /// R1 response bitset.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct R1Response(u8);
    impl Debug;
    pub in_idle_state, _: 0;
    pub erase_reset, _: 1;
    pub illegal_command, _: 2;
    pub command_crc_error, _: 3;
    pub erase_sequence_error, _: 4;
    pub address_error, _: 5;
    pub parameter_error, _: 6;
    pub start_bit, _: 7;
}

impl R1Response {
    /// Card finished initialization, no error.
    pub const READY_STATE: Self = R1Response(0x00);
    /// Card still in idle state, no error.
    pub const IN_IDLE_STATE: Self = R1Response(0x01);
    /// Idle card that doesn't know the command.
    pub const IN_IDLE_AND_ILLEGAL: Self = R1Response(0x05);

    /// The start bit reads 0 in every real response.
    pub fn is_valid(&self) -> bool {
        !self.start_bit()
    }

    /// Any status bit other than idle is set.
    pub fn has_error(&self) -> bool {
        (self.0 & !Self::IN_IDLE_STATE.0) != 0
    }
}

bitfield! {
    /// Second status byte of an R2 response.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct R2Status(u8);
    impl Debug;
    pub card_locked, _: 0;
    pub lock_unlock_failed, _: 1;
    pub error, _: 2;
    pub card_controller_error, _: 3;
    pub card_ecc_failed, _: 4;
    pub write_protect_violation, _: 5;
    pub erase_param, _: 6;
    pub out_of_range, _: 7;
}

bitfield! {
    /// Operating Conditions Register, R3 payload. `voltage_window` bit 0 is 2.7-2.8V.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Ocr(u32);
    impl Debug;
    pub u16, voltage_window, _: 23, 15;
    pub switching_to_1v8_accepted, _: 24;
    pub over_2tb_support, _: 27;
    pub uhs2_card_status, _: 29;
    pub card_capacity_status, _: 30;
    pub power_up_complete, _: 31;
}

bitfield! {
    /// Interface condition echo, R7 payload.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct IfCond(u32);
    impl Debug;
    pub u8, check_pattern, _: 7, 0;
    pub u8, voltage_accepted, _: 11, 8;
    pub u8, command_version, _: 31, 28;
}

/// Response format expected after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseKind {
    R1,
    R2,
    R3,
    R7,
}

/// Card response tagged by its format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    R1(R1Response),
    R2(R1Response, R2Status),
    R3(R1Response, Ocr),
    R7(R1Response, IfCond),
}

impl Response {
    /// Leading R1 status byte shared by every format.
    pub fn r1(&self) -> R1Response {
        match *self {
            Response::R1(r1)
            | Response::R2(r1, _)
            | Response::R3(r1, _)
            | Response::R7(r1, _) => r1,
        }
    }

    /// Format of this response.
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::R1(_) => ResponseKind::R1,
            Response::R2(..) => ResponseKind::R2,
            Response::R3(..) => ResponseKind::R3,
            Response::R7(..) => ResponseKind::R7,
        }
    }

    /// Build a response from the R1 byte and the bytes that follow it.
    pub(crate) fn assemble(kind: ResponseKind, r1: R1Response, tail: [u8; 4]) -> Self {
        match kind {
            ResponseKind::R1 => Response::R1(r1),
            ResponseKind::R2 => Response::R2(r1, R2Status(tail[0])),
            ResponseKind::R3 => Response::R3(r1, Ocr(u32::from_be_bytes(tail))),
            ResponseKind::R7 => Response::R7(r1, IfCond(u32::from_be_bytes(tail))),
        }
    }
}

impl ResponseKind {
    /// Count of bytes following the R1 byte.
    pub fn tail_len(self) -> usize {
        match self {
            ResponseKind::R1 => 0,
            ResponseKind::R2 => 1,
            ResponseKind::R3 | ResponseKind::R7 => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r1_flags() {
        let r1 = R1Response(0x05);
        assert!(r1.in_idle_state());
        assert!(r1.illegal_command());
        assert!(r1.has_error());
        assert!(r1.is_valid());
        assert_eq!(r1, R1Response::IN_IDLE_AND_ILLEGAL);

        assert!(!R1Response::IN_IDLE_STATE.has_error());
        assert!(!R1Response::READY_STATE.has_error());
        assert!(!R1Response(0xFF).is_valid());
    }

    #[test]
    fn ocr_capacity_status() {
        let ocr = Ocr(0xC0FF_8000);
        assert!(ocr.power_up_complete());
        assert!(ocr.card_capacity_status());
        assert_eq!(ocr.voltage_window(), 0x1FF);

        assert!(!Ocr(0x80FF_8000).card_capacity_status());
    }

    #[test]
    fn assembles_by_kind() {
        let r1 = R1Response::IN_IDLE_STATE;
        let tail = [0x00, 0x00, 0x01, 0xAA];

        let response = Response::assemble(ResponseKind::R7, r1, tail);
        assert_eq!(response.kind(), ResponseKind::R7);
        assert_eq!(response.r1(), r1);
        match response {
            Response::R7(_, if_cond) => {
                assert_eq!(if_cond.check_pattern(), 0xAA);
                assert_eq!(if_cond.voltage_accepted(), 0x1);
            }
            other => panic!("unexpected {:?}", other),
        }

        let response = Response::assemble(ResponseKind::R2, r1, [0x20, 0, 0, 0]);
        match response {
            Response::R2(_, status) => assert!(status.write_protect_violation()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
