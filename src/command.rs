use crate::{
    consts::commands,
    crc::frame_checksum,
    response::ResponseKind,
};

/// Command frame length: index, 4 argument bytes, checksum.
pub const FRAME_LEN: usize = 6;

/// Build the frame for a plain command (`cmd` already carries the class bits).
pub fn command_frame(cmd: u8, arg: u32) -> [u8; FRAME_LEN] {
    let arg = arg.to_be_bytes();
    let mut frame = [cmd, arg[0], arg[1], arg[2], arg[3], 0];
    frame[FRAME_LEN - 1] = frame_checksum(&frame[..FRAME_LEN - 1]);
    frame
}

/// Whether the command has to be prefixed with `APP_CMD`.
pub fn is_app_command(cmd: u8) -> bool {
    (cmd & commands::ACMD_FLAG) != 0
}

/// Response format the card answers `cmd` with.
pub fn response_kind(cmd: u8) -> ResponseKind {
    match cmd & !commands::ACMD_FLAG {
        commands::CMD8 => ResponseKind::R7,
        commands::CMD58 => ResponseKind::R3,
        commands::CMD13 => ResponseKind::R2,
        _ => ResponseKind::R1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn frames_with_checksum() {
        assert_eq!(command_frame(commands::CMD0, 0), hex!("40 00 00 00 00 95"));
        assert_eq!(
            command_frame(commands::CMD8, 0x1AA),
            hex!("48 00 00 01 AA 87")
        );
        assert_eq!(
            command_frame(commands::ACMD41 & !commands::ACMD_FLAG, 0x4000_0000),
            hex!("69 40 00 00 00 77")
        );
        assert_eq!(command_frame(commands::CMD58, 0), hex!("7A 00 00 00 00 FD"));
    }

    #[test]
    fn argument_is_big_endian() {
        let frame = command_frame(commands::CMD17, 0x1234_5678);
        assert_eq!(&frame[1..5], &hex!("12 34 56 78"));
        assert_eq!(frame[5] & 0x01, 0x01);
    }

    #[test]
    fn response_kinds() {
        assert_eq!(response_kind(commands::CMD0), ResponseKind::R1);
        assert_eq!(response_kind(commands::CMD8), ResponseKind::R7);
        assert_eq!(response_kind(commands::CMD58), ResponseKind::R3);
        assert_eq!(response_kind(commands::CMD13), ResponseKind::R2);
        assert_eq!(response_kind(commands::ACMD13), ResponseKind::R2);
        assert_eq!(response_kind(commands::ACMD41), ResponseKind::R1);
        assert!(is_app_command(commands::ACMD41));
        assert!(!is_app_command(commands::CMD55));
    }
}
