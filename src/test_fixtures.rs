// ABOUTME: Test-only DTB assembly helpers and a Raspberry Pi 4 shaped fixture
// ABOUTME: Produces real blobs so tests exercise the decoder end to end

use crate::dtb::DtbHeader;
use crate::dtb::DtbToken;
use std::collections::HashMap;

/// Assembles a version 17 DTB from begin/end/property calls.
#[derive(Debug, Default)]
pub struct FdtBuilder {
    structure: Vec<u8>,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
}

impl FdtBuilder {
    /// Memory reservation block: a single terminating entry
    const MEM_RSVMAP_SIZE: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute offset of the structure block in the finished blob
    pub fn struct_offset(&self) -> usize {
        DtbHeader::SIZE + Self::MEM_RSVMAP_SIZE
    }

    pub fn raw_word(&mut self, word: u32) -> &mut Self {
        self.structure.extend_from_slice(&word.to_be_bytes());
        self
    }

    fn pad(&mut self) {
        while self.structure.len() % 4 != 0 {
            self.structure.push(0);
        }
    }

    pub fn nop(&mut self) -> &mut Self {
        self.raw_word(DtbToken::FDT_NOP)
    }

    pub fn begin_node(&mut self, name: &str) -> &mut Self {
        self.raw_word(DtbToken::FDT_BEGIN_NODE);
        self.structure.extend_from_slice(name.as_bytes());
        self.structure.push(0);
        self.pad();
        self
    }

    pub fn end_node(&mut self) -> &mut Self {
        self.raw_word(DtbToken::FDT_END_NODE)
    }

    fn string_offset(&mut self, name: &str) -> u32 {
        if let Some(&offset) = self.string_offsets.get(name) {
            return offset;
        }
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(name.to_string(), offset);
        offset
    }

    pub fn prop_raw_name_offset(&mut self, name_offset: u32, data: &[u8]) -> &mut Self {
        self.raw_word(DtbToken::FDT_PROP);
        self.raw_word(data.len() as u32);
        self.raw_word(name_offset);
        self.structure.extend_from_slice(data);
        self.pad();
        self
    }

    pub fn prop(&mut self, name: &str, data: &[u8]) -> &mut Self {
        let offset = self.string_offset(name);
        self.prop_raw_name_offset(offset, data)
    }

    pub fn prop_empty(&mut self, name: &str) -> &mut Self {
        self.prop(name, &[])
    }

    pub fn prop_cells(&mut self, name: &str, cells: &[u32]) -> &mut Self {
        let data: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.prop(name, &data)
    }

    pub fn prop_str(&mut self, name: &str, value: &str) -> &mut Self {
        self.prop_strs(name, &[value])
    }

    pub fn prop_strs(&mut self, name: &str, values: &[&str]) -> &mut Self {
        let mut data = Vec::new();
        for value in values {
            data.extend_from_slice(value.as_bytes());
            data.push(0);
        }
        self.prop(name, &data)
    }

    /// Emit the end token and assemble the blob
    pub fn finish(&self) -> Vec<u8> {
        let mut structure = self.structure.clone();
        structure.extend_from_slice(&DtbToken::FDT_END.to_be_bytes());
        self.assemble(&structure)
    }

    /// Assemble the blob without an end token
    pub fn finish_without_end(&self) -> Vec<u8> {
        self.assemble(&self.structure)
    }

    fn assemble(&self, structure: &[u8]) -> Vec<u8> {
        let off_struct = self.struct_offset();
        let off_strings = off_struct + structure.len();
        let total = off_strings + self.strings.len();

        let fields = [
            DtbHeader::MAGIC,
            total as u32,
            off_struct as u32,
            off_strings as u32,
            DtbHeader::SIZE as u32,
            17,
            16,
            0,
            self.strings.len() as u32,
            structure.len() as u32,
        ];

        let mut blob: Vec<u8> = fields.iter().flat_map(|f| f.to_be_bytes()).collect();
        blob.extend_from_slice(&[0u8; Self::MEM_RSVMAP_SIZE]);
        blob.extend_from_slice(structure);
        blob.extend_from_slice(&self.strings);
        blob
    }
}

/// A trimmed Raspberry Pi 4 device tree: `/soc` and `/scb` buses with
/// `ranges`, aliases, and nodes whose properties cover every value shape.
pub fn rpi4_blob() -> Vec<u8> {
    let mut fdt = FdtBuilder::new();
    fdt.begin_node("")
        .prop_strs("compatible", &["raspberrypi,4-model-b", "brcm,bcm2711"])
        .prop_cells("#address-cells", &[2])
        .prop_cells("#size-cells", &[1])
        .prop_str("model", "Raspberry Pi 4 Model B");

    fdt.begin_node("aliases")
        .prop_str("serial1", "/soc/serial@7e215040")
        .prop_str("ethernet0", "/scb/ethernet@7d580000")
        .prop_str("pcie0", "/scb/pcie@7d500000")
        .prop_str("broken", "/soc/missing@0")
        .end_node();

    fdt.begin_node("clocks")
        .begin_node("clk-osc")
        .prop_strs("compatible", &["fixed-clock"])
        .prop_cells("#clock-cells", &[0])
        .prop_strs("clock-output-names", &["osc"])
        .prop_cells("clock-frequency", &[0x337f980])
        .prop_cells("phandle", &[0x3])
        .end_node()
        .end_node();

    fdt.begin_node("soc")
        .prop_strs("compatible", &["simple-bus"])
        .prop_cells("#address-cells", &[1])
        .prop_cells("#size-cells", &[1])
        .prop_cells(
            "ranges",
            &[
                0x7e00_0000, 0x0, 0xfe00_0000, 0x0180_0000, //
                0x4000_0000, 0x0, 0xff80_0000, 0x0080_0000,
            ],
        );

    fdt.begin_node("serial@7e215040")
        .prop_strs("compatible", &["brcm,bcm2835-aux-uart"])
        .prop_cells("reg", &[0x7e21_5040, 0x40])
        .prop_cells("interrupts", &[0x00, 0x5d, 0x04])
        .prop_cells("clocks", &[0x0c, 0x00])
        .prop_str("status", "okay")
        .end_node();

    fdt.begin_node("local_intc@40000000")
        .prop_strs("compatible", &["brcm,bcm2836-l1-intc"])
        .prop_cells("reg", &[0x4000_0000, 0x100])
        .end_node();

    fdt.begin_node("interrupt-controller@40041000")
        .prop_cells("#interrupt-cells", &[0x1])
        .prop_strs("compatible", &["arm,gic-400"])
        .prop_cells(
            "reg",
            &[0x4004_1000, 0x1000, 0x4004_2000, 0x2000, 0x4004_6000, 0x2000],
        )
        .prop_cells("interrupts", &[0x01, 0x09, 0xf04])
        .prop_cells("phandle", &[0x01])
        .end_node();

    fdt.begin_node("power")
        .prop_strs("compatible", &["raspberrypi,bcm2835-power"])
        .prop_cells("firmware", &[0x1d])
        .prop_cells("#power-domain-cells", &[0x1])
        .prop_cells("phandle", &[0x0b])
        .end_node();

    fdt.begin_node("dsi@7e209000")
        .prop_strs("compatible", &["brcm,bcm2835-dsi0"])
        .prop_cells("reg", &[0x7e20_9000, 0x78])
        .prop_cells("#address-cells", &[0x1])
        .prop_cells("#size-cells", &[0x0])
        .prop_cells("clocks", &[0x06, 0x20, 0x06, 0x2f, 0x06, 0x31])
        .prop_strs("clock-names", &["phy", "escape", "pixel"])
        .prop_strs("clock-output-names", &["dsi0_byte", "dsi0_ddr2", "dsi0_ddr"])
        .prop_str("status", "disabled")
        .prop_cells("phandle", &[0x4])
        .end_node();

    fdt.begin_node("usb@7e980000")
        .prop_strs("compatible", &["brcm,bcm2835-usb"])
        .prop_cells("reg", &[0x7e98_0000, 0x10000])
        .prop_cells("interrupts", &[0x00, 0x49, 0x04])
        .prop_cells("#address-cells", &[0x1])
        .prop_cells("#size-cells", &[0x0])
        .prop_cells("clocks", &[0x12])
        .prop_str("clock-names", "otg")
        .prop_cells("phys", &[0x13])
        .prop_str("phys-names", "usb2-phy")
        .prop_str("dr_mode", "peripheral")
        .prop_cells("g-rx-fifo-size", &[0x100])
        .prop_cells(
            "g-tx-fifo-size",
            &[0x100, 0x100, 0x200, 0x200, 0x200, 0x300, 0x300],
        )
        .prop("mac-address", &[0xdc, 0xa6, 0x32, 0x01, 0x02, 0x03])
        .end_node();

    fdt.begin_node("dsi@7e700000")
        .prop_strs("compatible", &["brcm,bcm2835-dsi1"])
        .prop_cells("reg", &[0x7e70_0000, 0x8c])
        .prop_cells("clocks", &[0x06, 0x23, 0x06, 0x30, 0x06, 0x32])
        .prop_strs("clock-names", &["phy", "escape", "pixel"])
        .prop_strs("clock-output-names", &["dsi1_byte", "dsi1_ddr2", "dsi1_ddr"])
        .prop_str("status", "disabled")
        .prop_cells("phandle", &[0x05])
        .end_node();

    // soc
    fdt.end_node();

    fdt.begin_node("scb")
        .prop_strs("compatible", &["simple-bus"])
        .prop_cells("#address-cells", &[2])
        .prop_cells("#size-cells", &[1])
        .prop_cells("ranges", &[0x0, 0x7c00_0000, 0x0, 0xfc00_0000, 0x0380_0000]);

    fdt.begin_node("pcie@7d500000")
        .prop_strs("compatible", &["brcm,bcm2711-pcie"])
        .prop_cells("reg", &[0x0, 0x7d50_0000, 0x9310])
        .prop_str("device_type", "pci")
        .prop_cells("#address-cells", &[0x3])
        .prop_cells("#size-cells", &[0x2])
        .prop_strs("interrupt-names", &["pcie", "msi"])
        .prop_empty("msi-controller")
        .prop_cells("msi-parent", &[0x24])
        .prop_empty("brcm,enable-ssc")
        .prop_cells("phandle", &[0x24])
        .end_node();

    fdt.begin_node("ethernet@7d580000")
        .prop_strs("compatible", &["brcm,bcm2711-genet-v5"])
        .prop_cells("reg", &[0x0, 0x7d58_0000, 0x10000])
        .prop_cells("#address-cells", &[0x1])
        .prop_cells("#size-cells", &[0x1])
        .prop_cells("interrupts", &[0x00, 0x9d, 0x04, 0x00, 0x9e, 0x04])
        .prop_str("status", "okay")
        .prop_cells("phy-handle", &[0x26])
        .prop_str("phy-mode", "rgmii-rxid")
        .end_node();

    // scb, root
    fdt.end_node().end_node();
    fdt.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_layout() {
        let mut fdt = FdtBuilder::new();
        fdt.begin_node("").prop_cells("reg", &[1]).end_node();
        let blob = fdt.finish();

        let (_, header) = DtbHeader::parse(&blob).unwrap();
        assert_eq!(header.totalsize as usize, blob.len());
        assert_eq!(header.off_dt_struct as usize, fdt.struct_offset());
        // begin(4) + name(4) + prop(12) + payload(4) + end-node(4) + end(4)
        assert_eq!(header.size_dt_struct, 32);
        assert_eq!(header.size_dt_strings, 4);
    }

    #[test]
    fn test_strings_are_deduplicated() {
        let mut fdt = FdtBuilder::new();
        fdt.begin_node("")
            .prop_cells("reg", &[1])
            .begin_node("a")
            .prop_cells("reg", &[2])
            .end_node()
            .end_node();
        let blob = fdt.finish();
        let (_, header) = DtbHeader::parse(&blob).unwrap();
        assert_eq!(header.size_dt_strings, 4);
    }
}
