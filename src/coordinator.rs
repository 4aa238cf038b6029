//! Receiver coordinator (spec §4.8, §5): dispatches a demodulated
//! subframe to PUCCH first, then PUSCH, and owns the per-HARQ-process
//! softbuffer lifecycle across subframes. Resource grids are created
//! and dropped every subframe (spec §3); softbuffers persist across
//! subframes, keyed by HARQ process id, until a new-data-indicator
//! toggle or an explicit release.

use std::collections::HashMap;

use crate::config::cell::CellConfig;
use crate::config::flags::ReceiverFlags;
use crate::config::pucch::{PucchFormat, PucchThresholds};
use crate::error::{PhyError, PhyResult};
use crate::estimator::ChannelEstimate;
use crate::grant::{PucchGrant, PuschGrant, UciValue};
use crate::grid::ResourceGrid;
use crate::numeric::cpx::Cpx;
use crate::ofdm::{OfdmConfig, OfdmFrontEnd};
use crate::pucch;
use crate::pusch;
use crate::sch::segmentation::{segment, SegmentationResult};
use crate::sch::softbuffer::HarqSoftbuffer;
use crate::sch::{decode_transport_block, encode_transport_block, TransportBlockOutcome};

pub struct ReceiverCoordinator {
    cell: CellConfig,
    ofdm_cfg: OfdmConfig,
    front_end: OfdmFrontEnd,
    flags: ReceiverFlags,
    harq_buffers: HashMap<u8, (SegmentationResult, HarqSoftbuffer)>,
}

#[derive(Debug, Clone)]
pub struct PuschOutcome {
    pub transport_block: Option<Vec<u8>>,
    pub measurement: ChannelEstimate,
    /// Set when every code block's CRC24B passed but the reassembled
    /// transport block's CRC24A did not (spec §7: data, not an error).
    /// The HARQ softbuffer's CRC flags have already been cleared so the
    /// next retransmission re-accumulates from scratch.
    pub crc_collision: bool,
    pub uci: UciValue,
}

impl ReceiverCoordinator {
    pub fn new(cell: CellConfig, ofdm_cfg: OfdmConfig, flags: ReceiverFlags) -> Self {
        let front_end = OfdmFrontEnd::new(&cell);
        Self {
            cell,
            ofdm_cfg,
            front_end,
            flags,
            harq_buffers: HashMap::new(),
        }
    }

    pub fn cell(&self) -> &CellConfig {
        &self.cell
    }

    /// Time-to-frequency conversion for one subframe's worth of
    /// samples; the returned grid is owned by the caller and is not
    /// retained across subframes.
    pub fn demodulate(&self, samples: &[Cpx]) -> ResourceGrid {
        self.front_end.demodulate_subframe(&self.cell, &self.ofdm_cfg, samples)
    }

    /// Decode a Format 1/1a/1b PUCCH grant against already-extracted
    /// reference and data vectors. Sequence generation (the cyclic-
    /// shift hopping pattern, group/sequence hopping root selection) is
    /// the caller's responsibility via [`crate::numeric::sequence`];
    /// the coordinator only dispatches to the matching format decoder
    /// and detection threshold.
    pub fn process_pucch_format1(
        &self,
        grant: &PucchGrant,
        received: &[Cpx],
        base_sequence: &[Cpx],
        cover_code: &[Cpx],
        thresholds: &PucchThresholds,
    ) -> PhyResult<UciValue> {
        if !matches!(grant.resource.format, PucchFormat::Format1 | PucchFormat::Format1a | PucchFormat::Format1b) {
            return Err(PhyError::InvalidGrant("grant is not a Format 1-family resource".into()));
        }
        let decision = pucch::decode_format1(grant.resource.format, received, base_sequence, cover_code, thresholds);

        // Spec §4.8 step 3: when SR is configured alongside ACK and the
        // combined hypothesis search misses, retry under the
        // presence-only (Format 1, SR-alone) hypothesis and keep
        // whichever attempt correlates higher — a weak ACK payload can
        // mask an otherwise-detectable SR-only transmission.
        let decision = if grant.uci.sr_present && !decision.detected && grant.resource.format != PucchFormat::Format1 {
            let retry = pucch::decode_format1(PucchFormat::Format1, received, base_sequence, cover_code, thresholds);
            if retry.correlation > decision.correlation {
                retry
            } else {
                decision
            }
        } else {
            decision
        };

        Ok(UciValue {
            ack_bits: decision.ack_bits,
            sr: grant.uci.sr_present && decision.detected,
            ack_valid: decision.detected,
            ..Default::default()
        })
    }

    /// Decode a Format 2/2a/2b PUCCH grant: channel-estimates from the
    /// reference symbols (spec §4.3), equalizes the 10 QPSK data
    /// symbols and decodes the RM-coded CQI, plus the extra ACK/NACK
    /// bit(s) Format 2a/2b carry on the second reference symbol.
    pub fn process_pucch_format2(
        &self,
        grant: &PucchGrant,
        rx_ref: &[Vec<Cpx>],
        rx_data: &[Cpx],
        known_ref: &[Cpx],
        payload_hypotheses: &[Vec<Cpx>],
        thresholds: &PucchThresholds,
    ) -> PhyResult<UciValue> {
        if !matches!(grant.resource.format, PucchFormat::Format2 | PucchFormat::Format2a | PucchFormat::Format2b) {
            return Err(PhyError::InvalidGrant("grant is not a Format 2-family resource".into()));
        }
        let estimate = crate::estimator::pucch::estimate_pucch(
            &self.cell,
            grant.resource.format,
            rx_ref,
            known_ref,
            payload_hypotheses,
            !rx_ref.is_empty(),
        )?;
        let channel = &estimate.channel.coefficients;
        let equalized: Vec<Cpx> = rx_data
            .iter()
            .zip(channel.iter().cycle())
            .map(|(&r, &h)| if h.norm_sqr() > 1e-20 { r / h } else { Cpx::new(0.0, 0.0) })
            .collect();
        let reference: Vec<Cpx> = rx_ref.iter().flatten().copied().collect();

        let decision = pucch::decode_format2(&equalized, &reference, thresholds);
        Ok(UciValue {
            cqi: Some(decision.cqi_bits),
            cqi_valid: decision.detected,
            ack_bits: estimate.extra_payload_bits.clone().unwrap_or_default(),
            ack_valid: estimate.extra_payload_bits.is_some(),
            ..Default::default()
        })
    }

    /// Decode a Format 3 PUCCH grant: channel-estimates from the
    /// reference symbols, equalizes the 16 QPSK-block-spread data
    /// symbols and decodes the (32, k) block code, `k` taken from the
    /// grant's configured ACK/SR/RI bit counts.
    pub fn process_pucch_format3(
        &self,
        grant: &PucchGrant,
        rx_ref: &[Vec<Cpx>],
        rx_data: &[Cpx],
        known_ref: &[Cpx],
        thresholds: &PucchThresholds,
    ) -> PhyResult<UciValue> {
        if grant.resource.format != PucchFormat::Format3 {
            return Err(PhyError::InvalidGrant("grant is not a Format 3 resource".into()));
        }
        let estimate = crate::estimator::pucch::estimate_pucch(
            &self.cell,
            grant.resource.format,
            rx_ref,
            known_ref,
            &[],
            !rx_ref.is_empty(),
        )?;
        let channel = &estimate.channel.coefficients;
        let equalized: Vec<Cpx> = rx_data
            .iter()
            .zip(channel.iter().cycle())
            .map(|(&r, &h)| if h.norm_sqr() > 1e-20 { r / h } else { Cpx::new(0.0, 0.0) })
            .collect();
        let reference: Vec<Cpx> = rx_ref.iter().flatten().copied().collect();

        let k = (grant.uci.ack_bits as usize + grant.uci.ri_bits as usize + grant.uci.sr_present as usize).min(22);
        let decision = pucch::decode_format3(&equalized, &reference, k, thresholds);

        let mut ack_bits = decision.bits.clone();
        ack_bits.truncate(grant.uci.ack_bits as usize);
        Ok(UciValue {
            ack_bits,
            sr: grant.uci.sr_present && decision.detected,
            ack_valid: decision.detected,
            ..Default::default()
        })
    }

    /// Process one PUSCH grant's allocation against an already-
    /// demodulated subframe grid: equalize, undo transform precoding,
    /// soft-demodulate, HARQ-combine and turbo-decode. Owns the
    /// per-`harq_process_id` softbuffer lifecycle: a new-data-indicator
    /// toggle (re-)allocates fresh code-block shaping; otherwise the
    /// existing softbuffer keeps accumulating across retransmissions.
    pub fn process_pusch(
        &mut self,
        grid: &ResourceGrid,
        grant: &PuschGrant,
        estimate: &ChannelEstimate,
        tb_size_bits: usize,
    ) -> PhyResult<PuschOutcome> {
        if grant.intra_subframe_hopping {
            return Err(PhyError::Unsupported(
                "intra-subframe frequency hopping is not implemented by the PUSCH processor".into(),
            ));
        }
        grant.validate(self.cell.n_prb as usize, 8)?;

        let needs_new_shape = grant.new_data_indicator || !self.harq_buffers.contains_key(&grant.harq_process_id);
        if needs_new_shape {
            let shape = segment(&vec![0u8; tb_size_bits], 8)?;
            let buffer = HarqSoftbuffer::new();
            self.harq_buffers.insert(grant.harq_process_id, (shape, buffer));
        }

        let (shape, buffer) = self
            .harq_buffers
            .get_mut(&grant.harq_process_id)
            .expect("softbuffer entry inserted above");

        let soft = pusch::process(grid, &grant.prb_set, self.cell.cp_kind, estimate, grant.modulation)?;

        let m_sc = grant.n_prb() * 12;
        let n_symb = if m_sc == 0 { 0 } else { soft.llrs.len() / (m_sc * grant.modulation.bits_per_symbol()) };
        let k: usize = shape.blocks.iter().map(|b| b.bits.len()).sum();
        let (data_llrs, uci) = pusch::demultiplex_uci(&soft.llrs, grant.modulation, &grant.uci, n_symb, m_sc, k);

        let n_blocks = shape.blocks.len().max(1);
        let per_block_len = data_llrs.len() / n_blocks;
        let llrs_per_block: Vec<Vec<f32>> = (0..n_blocks)
            .map(|i| {
                let start = i * per_block_len;
                let end = if i + 1 == n_blocks { data_llrs.len() } else { start + per_block_len };
                data_llrs[start..end].to_vec()
            })
            .collect();

        let outcome = decode_transport_block(
            shape,
            buffer,
            grant.redundancy_version,
            &llrs_per_block,
            self.flags.max_turbo_iterations as usize,
            grant.new_data_indicator,
        )?;

        let (transport_block, crc_collision) = match outcome {
            TransportBlockOutcome::Decoded(tb) => (Some(tb), false),
            TransportBlockOutcome::Pending => (None, false),
            TransportBlockOutcome::CrcCollision => (None, true),
        };

        Ok(PuschOutcome { transport_block, measurement: estimate.clone(), crc_collision, uci })
    }

    /// Encode a transport block for transmit-side testing / loopback:
    /// segments, turbo-encodes and rate-matches to the requested
    /// per-block output lengths.
    pub fn encode_pusch(
        &self,
        transport_block: &[u8],
        rv: u8,
        e_per_block: &[usize],
    ) -> PhyResult<(SegmentationResult, Vec<Vec<u8>>)> {
        encode_transport_block(transport_block, rv, e_per_block, 8)
    }

    /// Drop a HARQ process's softbuffer, e.g. after the MAC layer
    /// reports it has stopped retransmitting.
    pub fn release_harq_process(&mut self, harq_process_id: u8) {
        self.harq_buffers.remove(&harq_process_id);
    }

    pub fn active_harq_processes(&self) -> usize {
        self.harq_buffers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cell::{CpKind, FrameStructure};
    use crate::config::pucch::PucchResourceConfig;
    use crate::grant::{Modulation, UciConfig};

    fn coordinator() -> ReceiverCoordinator {
        let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
        ReceiverCoordinator::new(cell, OfdmConfig::default(), ReceiverFlags::default())
    }

    #[test]
    fn pucch_format1_round_trip() {
        let coord = coordinator();
        let grant = PucchGrant {
            resource: PucchResourceConfig {
                format: PucchFormat::Format1a,
                n_pucch: 0,
                cyclic_shift: 0,
                orthogonal_cover_index: 0,
                channel_selection_table: None,
            },
            uci: UciConfig::default(),
        };
        let base: Vec<Cpx> = (0..12).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect();
        let cover = vec![Cpx::new(1.0, 0.0); 4];
        let tx = pucch::encode_format1(PucchFormat::Format1a, &base, &[1], &cover);

        let uci = coord
            .process_pucch_format1(&grant, &tx, &base, &cover, &PucchThresholds::default())
            .unwrap();
        assert!(uci.ack_valid);
        assert_eq!(uci.ack_bits, vec![1]);
    }

    #[test]
    fn pucch_format1_sr_retry_recovers_presence_when_ack_hypothesis_fails() {
        let coord = coordinator();
        let grant = PucchGrant {
            resource: PucchResourceConfig {
                format: PucchFormat::Format1b,
                n_pucch: 0,
                cyclic_shift: 0,
                orthogonal_cover_index: 0,
                channel_selection_table: None,
            },
            uci: UciConfig { sr_present: true, ..UciConfig::default() },
        };
        let base: Vec<Cpx> = (0..12).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect();
        let cover = vec![Cpx::new(1.0, 0.0); 4];
        // Transmitted as presence-only (Format 1): every Format 1b QPSK
        // payload hypothesis correlates against a rotated/scaled symbol
        // that was never applied, so the best hypothesis (correlation
        // 1/sqrt(2)) misses a stringent threshold while the Format-1
        // presence-only retry (correlation 1.0) clears it.
        let tx = pucch::encode_format1(PucchFormat::Format1, &base, &[], &cover);
        let mut thresholds = PucchThresholds::default();
        thresholds.data_validity_threshold = 0.9;

        let uci = coord.process_pucch_format1(&grant, &tx, &base, &cover, &thresholds).unwrap();
        assert!(uci.sr);
    }

    #[test]
    fn pucch_format2_round_trips_with_unit_channel() {
        let coord = coordinator();
        let known_ref = vec![Cpx::new(1.0, 0.0); 12];
        let rx_ref = vec![known_ref.clone(), known_ref.clone()];
        let info: [u8; 13] = [1, 0, 1, 1, 0, 0, 1, 0, 1, 0, 0, 1, 1];
        let tx: Vec<Cpx> = pucch::encode_format2(&info).iter().map(|&s| s * 3.0).collect();
        let grant = PucchGrant {
            resource: PucchResourceConfig {
                format: PucchFormat::Format2,
                n_pucch: 0,
                cyclic_shift: 0,
                orthogonal_cover_index: 0,
                channel_selection_table: None,
            },
            uci: UciConfig::default(),
        };

        let uci = coord
            .process_pucch_format2(&grant, &rx_ref, &tx, &known_ref, &[], &PucchThresholds::default())
            .unwrap();
        assert!(uci.cqi_valid);
        assert_eq!(uci.cqi.unwrap(), info.to_vec());
    }

    #[test]
    fn pucch_format3_round_trips_with_unit_channel() {
        let coord = coordinator();
        let known_ref = vec![Cpx::new(1.0, 0.0); 12];
        let rx_ref = vec![known_ref.clone(), known_ref.clone()];
        let info = vec![1u8, 1, 0, 0, 1, 0, 1];
        let tx: Vec<Cpx> = pucch::encode_format3(&info).iter().map(|&s| s * 4.0).collect();
        let grant = PucchGrant {
            resource: PucchResourceConfig {
                format: PucchFormat::Format3,
                n_pucch: 0,
                cyclic_shift: 0,
                orthogonal_cover_index: 0,
                channel_selection_table: None,
            },
            uci: UciConfig { ack_bits: info.len() as u8, ..UciConfig::default() },
        };

        let uci = coord
            .process_pucch_format3(&grant, &rx_ref, &tx, &known_ref, &PucchThresholds::default())
            .unwrap();
        assert!(uci.ack_valid);
        assert_eq!(uci.ack_bits, info);
    }

    #[test]
    fn harq_process_lifecycle_tracks_active_count() {
        let mut coord = coordinator();
        assert_eq!(coord.active_harq_processes(), 0);

        let grant = PuschGrant {
            rnti: 1,
            harq_process_id: 3,
            prb_set: vec![true, true, false, false, false, false],
            modulation: Modulation::Qpsk,
            redundancy_version: 0,
            new_data_indicator: true,
            uci: UciConfig::default(),
            intra_subframe_hopping: false,
        };
        // A fixed, non-zero, non-codeword symbol on every subcarrier:
        // not the all-zero grid (whose soft-demodulated LLRs are exactly
        // zero, an undecidable tie), but an arbitrary signal that is
        // certain not to satisfy a 24-bit CRC by chance (p ~ 2^-24).
        let mut grid = ResourceGrid::new(coord.cell().symbols_per_subframe(), coord.cell().n_subcarriers());
        for s in 0..grid.n_symbols() {
            for c in 0..grid.n_subcarriers() {
                grid.set(s, c, Cpx::new(0.7, 0.3));
            }
        }
        let estimate = ChannelEstimate::from_epre_rsrp(vec![Cpx::new(1.0, 0.0); 24], 1.0, 1.0, 0.1, 0.0, 0.0);

        let outcome = coord.process_pusch(&grid, &grant, &estimate, 100).unwrap();
        assert_eq!(outcome.transport_block, None, "an arbitrary non-codeword signal must not pass CRC");
        assert!(!outcome.crc_collision);
        assert_eq!(coord.active_harq_processes(), 1);

        coord.release_harq_process(3);
        assert_eq!(coord.active_harq_processes(), 0);
    }

    #[test]
    fn frequency_hopping_grant_is_rejected() {
        let mut coord = coordinator();
        let grant = PuschGrant {
            rnti: 1,
            harq_process_id: 0,
            prb_set: vec![true; 6],
            modulation: Modulation::Qpsk,
            redundancy_version: 0,
            new_data_indicator: true,
            uci: UciConfig::default(),
            intra_subframe_hopping: true,
        };
        let grid = ResourceGrid::new(coord.cell().symbols_per_subframe(), coord.cell().n_subcarriers());
        let estimate = ChannelEstimate::from_epre_rsrp(vec![], 1.0, 1.0, 0.1, 0.0, 0.0);
        let result = coord.process_pusch(&grid, &grant, &estimate, 100);
        assert!(matches!(result, Err(PhyError::Unsupported(_))));
    }
}
