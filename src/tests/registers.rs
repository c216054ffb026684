use crate::registers::*;

#[test]
fn test_can_control_reg() {
    assert_eq!([0b1000_0000], CanControlReg::new().with_reqop(0b100).into_bytes());
    assert_eq!(
        [0b0001_1101],
        CanControlReg::new()
            .with_abat(true)
            .with_osm(true)
            .with_clken(true)
            .with_clkpre(0b01)
            .into_bytes()
    );
}

#[test]
fn test_can_status_reg() {
    let reg = CanStatusReg::from(0b0110_1100);

    assert_eq!(0b011, reg.opmod());
    assert_eq!(0b110, reg.icod());
}

#[test]
fn test_interrupt_reg() {
    assert_eq!(0x03, u8::from(InterruptReg::new().with_rx0(true).with_rx1(true)));
    assert_eq!(0x80, u8::from(InterruptReg::new().with_merr(true)));
}

#[test]
fn test_tx_control_reg() {
    let reg = TxControlReg::new().with_txreq(true);
    assert_eq!(TxControlReg::MASK_TXREQ, u8::from(reg));

    let reg = TxControlReg::from(0b0111_1011);
    assert!(reg.abtf());
    assert!(reg.mloa());
    assert!(reg.txerr());
    assert!(reg.txreq());
    assert_eq!(0b11, reg.txp());
}

#[test]
fn test_rx_control_reg() {
    assert_eq!(0x60, u8::from(RxControlReg::new().with_rxm(RxControlReg::RXM_FILTER_OFF)));
    assert_eq!(0x04, u8::from(RxControlReg::new().with_bukt(true)));
    assert_eq!(0x01, u8::from(RxControlReg::new().with_filhit0(true)));
    assert!(RxControlReg::from(0x08).rxrtr());
}

#[test]
fn test_cnf_regs() {
    let cnf1 = Cnf1Reg::from(0x81);
    assert_eq!(0b10, cnf1.sjw());
    assert_eq!(1, cnf1.brp());

    let cnf2 = Cnf2Reg::from(0xE5);
    assert!(cnf2.btlmode());
    assert!(cnf2.sam());
    assert_eq!(4, cnf2.phseg1());
    assert_eq!(5, cnf2.prseg());

    let cnf3 = Cnf3Reg::from(0x83);
    assert!(cnf3.sof());
    assert!(!cnf3.wakfil());
    assert_eq!(3, cnf3.phseg2());
}

#[test]
fn test_register_addresses() {
    assert_eq!(0x0E, Register::CANSTAT.address());
    assert_eq!(0x0F, Register::CANCTRL.address());
    assert_eq!(0x2C, Register::CANINTF.address());
    assert_eq!(0x76, Register::RXB1DATA.address());
}

#[test]
fn test_instructions() {
    assert_eq!(0xC0, Instruction::Reset as u8);
    assert_eq!(0x03, Instruction::Read as u8);
    assert_eq!(0x02, Instruction::Write as u8);
    assert_eq!(0x05, Instruction::BitModify as u8);
    assert_eq!(0xA0, Instruction::ReadStatus as u8);
    assert_eq!(0xB0, Instruction::RxStatus as u8);
}
