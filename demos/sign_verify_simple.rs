use anyhow::Ok;
use bip322_simple::{generate, verify, DecodedPsbt, NetworkId, Signer};
use bitcoin::{key::Secp256k1, Address, CompressedPublicKey, Network, PrivateKey};

const NETWORK: NetworkId = NetworkId::Signet;
const PRIVATE_KEY: &str = "cTrF79uahxMC7bQGWh2931vepWPWqS8KtF8EkqgWwv3KMGZNJ2yP";

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let secp = Secp256k1::new();
    let private_key = PrivateKey::from_wif(PRIVATE_KEY)?;
    let pubkey = CompressedPublicKey::from_private_key(&secp, &private_key)?;

    let network: Network = NETWORK.into();
    let segwit = Address::p2wpkh(&pubkey, network).to_string();
    let taproot = Address::p2tr(&secp, pubkey.0.x_only_public_key().0, None, network).to_string();

    let message = "HELLO WORLD".to_string();

    for address in [segwit, taproot] {
        // what a wallet would be asked to sign
        let to_sign = generate(&message, &address, NETWORK)?;
        let decoded = DecodedPsbt::from_base64(&to_sign.to_string(), NETWORK)?;
        println!("{} to_sign txid {}", address, decoded.txid);

        let signature = Signer::new(
            PRIVATE_KEY.to_string(),
            message.clone(),
            address.clone(),
            NETWORK,
        )
        .sign()?;
        println!("{} signature {}", address, signature);

        assert!(verify(&address, &message, &signature, NETWORK)?);
        assert!(!verify(&address, "GOODBYE WORLD", &signature, NETWORK)?);
    }

    Ok(())
}
