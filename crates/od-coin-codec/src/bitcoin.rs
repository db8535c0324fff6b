use anyhow::{Result, anyhow, bail};
use bech32::{Fe32, hrp, segwit};
use sha2::{Digest, Sha256};

use crate::AddressCodec;

const P2PKH_VERSION: u8 = 0x00;
const P2SH_VERSION: u8 = 0x05;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const PUSH_20: u8 = 0x14;
/// `OP_1` is `0x51`; witness versions 1..=16 map onto `0x50 + version`.
const OP_1_BASE: u8 = 0x50;

/// Bitcoin mainnet addresses. Resolvers store the output script, users see
/// base58check (P2PKH, P2SH) or bech32/bech32m (segwit).
pub struct BitcoinCodec;

impl AddressCodec for BitcoinCodec {
    fn name(&self) -> &'static str {
        "bitcoin"
    }

    fn to_text(&self, script: &[u8]) -> Result<String> {
        match script {
            [OP_DUP, OP_HASH160, PUSH_20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
                Ok(base58check_encode(P2PKH_VERSION, hash))
            }
            [OP_HASH160, PUSH_20, hash @ .., OP_EQUAL] if hash.len() == 20 => {
                Ok(base58check_encode(P2SH_VERSION, hash))
            }
            [op, len, program @ ..] if usize::from(*len) == program.len() => {
                let version = witness_version(*op)?;
                segwit::encode(hrp::BC, version, program).map_err(|err| anyhow!("segwit: {err}"))
            }
            _ => bail!("unrecognised output script"),
        }
    }

    fn to_raw(&self, text: &str) -> Result<Vec<u8>> {
        if text.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("bc1")) {
            return segwit_script(text);
        }

        let payload = base58check_decode(text)?;
        let (version, hash) = payload
            .split_first()
            .ok_or_else(|| anyhow!("empty payload"))?;
        if hash.len() != 20 {
            bail!("expected a 20-byte hash, got {}", hash.len());
        }

        let script = match *version {
            P2PKH_VERSION => {
                let mut script = vec![OP_DUP, OP_HASH160, PUSH_20];
                script.extend_from_slice(hash);
                script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
                script
            }
            P2SH_VERSION => {
                let mut script = vec![OP_HASH160, PUSH_20];
                script.extend_from_slice(hash);
                script.push(OP_EQUAL);
                script
            }
            other => bail!("unsupported version byte {other:#04x}"),
        };
        Ok(script)
    }
}

fn segwit_script(text: &str) -> Result<Vec<u8>> {
    let (hrp, version, program) = segwit::decode(text).map_err(|err| anyhow!("segwit: {err}"))?;
    if hrp.to_lowercase() != "bc" {
        bail!("unexpected human readable part {hrp}");
    }

    let op = match version.to_u8() {
        0 => 0,
        v => OP_1_BASE + v,
    };
    let mut script = Vec::with_capacity(program.len() + 2);
    script.push(op);
    script.push(u8::try_from(program.len())?);
    script.extend_from_slice(&program);
    Ok(script)
}

fn witness_version(op: u8) -> Result<Fe32> {
    let version = match op {
        0 => 0,
        0x51..=0x60 => op - OP_1_BASE,
        other => bail!("unrecognised witness opcode {other:#04x}"),
    };
    Fe32::try_from(version).map_err(|err| anyhow!("witness version: {err}"))
}

fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(payload));
    let mut out = [0_u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

fn base58check_encode(version: u8, hash: &[u8]) -> String {
    let mut payload = Vec::with_capacity(hash.len() + 5);
    payload.push(version);
    payload.extend_from_slice(hash);
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    bs58::encode(payload).into_string()
}

fn base58check_decode(text: &str) -> Result<Vec<u8>> {
    let mut raw = bs58::decode(text)
        .into_vec()
        .map_err(|err| anyhow!("not base58: {err}"))?;
    if raw.len() < 5 {
        bail!("too short for base58check");
    }

    let body_len = raw.len() - 4;
    if checksum(&raw[..body_len]) != raw[body_len..] {
        bail!("base58check checksum mismatch");
    }
    raw.truncate(body_len);
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    fn roundtrip(text: &str, script_hex: &str) {
        let script = hex::decode(script_hex).unwrap();
        assert_eq!(BitcoinCodec.to_raw(text).unwrap(), script, "{text}");
        assert_eq!(BitcoinCodec.to_text(&script).unwrap(), text, "{script_hex}");
    }

    #[test]
    fn p2pkh() {
        roundtrip(
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
            "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac",
        );
    }

    #[test]
    fn p2sh() {
        roundtrip(
            "3Ai1JZ8pdJb2ksieUV8FsxSNVJCpoPi8W6",
            "a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1887",
        );
    }

    #[test]
    fn segwit_v0() {
        roundtrip(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "0014751e76e8199196d454941c45d1b3a323f1433bd6",
        );
    }

    #[test]
    fn uppercase_segwit_is_accepted() {
        let script = BitcoinCodec
            .to_raw("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4")
            .unwrap();
        assert_eq!(hex::encode(script), "0014751e76e8199196d454941c45d1b3a323f1433bd6");
    }

    #[test]
    fn rejects_bad_addresses() {
        // last character altered, checksum no longer matches
        assert!(BitcoinCodec.to_raw("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb").is_err());
        assert!(BitcoinCodec.to_raw("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx").is_err());
        assert!(BitcoinCodec.to_raw("not-an-address").is_err());
        assert!(BitcoinCodec.to_text(&[0x01, 0x02, 0x03]).is_err());
        assert!(BitcoinCodec.to_text(&[]).is_err());
    }
}
